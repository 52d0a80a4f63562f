//! Resource schema generator
//!
//! Prints the JSON schema of every declared resource kind as YAML.
//!
//! Usage: cargo run --bin schemagen > schemas/all.yaml

use yc_resource_provider::resources::generate_schemas;

fn main() -> anyhow::Result<()> {
    for (kind, schema) in generate_schemas()? {
        println!("---");
        println!("# {}", kind);
        print!("{}", schema);
    }
    Ok(())
}
