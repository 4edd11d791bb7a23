use anyhow::Result;

fn main() -> Result<()> {
    let doc = mailgate::api::openapi();
    println!("{}", doc.to_pretty_json()?);
    Ok(())
}
