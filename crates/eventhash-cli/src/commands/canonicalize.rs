//! Canonicalize command implementation.

use std::io::{self, Write};

use eventhash_canonical::PREHASH;
use eventhash_reader::EventHashGenerator;

use super::{config_builder, for_each_result};
use crate::errors::CliError;
use crate::CanonicalArgs;

pub fn run(common: CanonicalArgs) -> Result<(), CliError> {
    let config = config_builder(&common)?
        .join_with("\n")
        .outputs([PREHASH])
        .build()?;
    let generator = EventHashGenerator::new(config);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut first = true;
    for_each_result(&common, &generator, |result| {
        if !first {
            writeln!(out)?;
        }
        first = false;
        writeln!(out, "{}", result.get(PREHASH).unwrap_or_default())?;
        Ok(())
    })?;
    Ok(())
}
