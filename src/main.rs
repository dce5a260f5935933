use anyhow::{bail, Context, Result};
use staple_assets::scaffold::{render_stub, stub_file_name, StubKind};

const USAGE: &str = "usage: staple-assets <TypeName> [--plain]";

fn main() -> Result<()> {
    let mut type_name = None;
    let mut kind = StubKind::Guid;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--plain" => kind = StubKind::Staple,
            "-h" | "--help" => {
                println!("{USAGE}");
                return Ok(());
            }
            _ if type_name.is_none() => type_name = Some(arg),
            _ => bail!("unexpected argument {arg:?}\n{USAGE}"),
        }
    }
    let Some(type_name) = type_name else {
        bail!("missing type name\n{USAGE}");
    };

    let file_name = stub_file_name(&type_name).context("cannot scaffold asset")?;
    let stub = render_stub(&type_name, kind).context("cannot scaffold asset")?;
    println!("// {file_name}");
    print!("{stub}");
    Ok(())
}
