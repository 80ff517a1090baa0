use anyhow::Result;
use serde::Serialize;

pub fn pretty_json<T: Serialize>(o: T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&o)?);
    Ok(())
}
