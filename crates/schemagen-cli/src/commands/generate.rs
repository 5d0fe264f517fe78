//! Generate command - values document to OpenAPI schema

use std::io::Write;
use std::path::Path;

use crate::error::{CliError, Result};
use schemagen_core::{SchemaGenerator, generate_schema_from_values};

/// Generate the schema of a local values file
pub fn run_file(path: &Path, output: Option<&Path>) -> Result<()> {
    tracing::debug!(path = %path.display(), "reading values file");
    let schema = SchemaGenerator::default().generate_file(path)?;
    emit(schema, output)
}

/// Generate the schema of fetched values
pub fn run(values: &[u8], output: Option<&Path>) -> Result<()> {
    let schema = generate_schema_from_values(values)?;
    emit(schema, output)
}

/// Print the schema, or write it to `output`
fn emit(mut schema: Vec<u8>, output: Option<&Path>) -> Result<()> {
    schema.push(b'\n');

    match output {
        Some(path) => {
            std::fs::write(path, &schema).map_err(|e| CliError::io(path, e))?;
            tracing::info!(path = %path.display(), "schema written");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(&schema)
                .and_then(|_| stdout.flush())
                .map_err(|e| CliError::io(Path::new("<stdout>"), e))?;
        }
    }

    Ok(())
}
