//! Hash command implementation.

use std::io::{self, Write};

use eventhash_canonical::{parse_field_list, PREHASH};
use eventhash_reader::EventHashGenerator;

use super::{config_builder, for_each_result};
use crate::errors::CliError;
use crate::output;
use crate::CanonicalArgs;

const DEFAULT_ALGORITHM: &str = "sha-256";

/// Output names in request order: `prehash` first when asked for, then the
/// algorithms (SHA-256 when none are given).
fn requested_outputs(algorithms: &[String], prehash: bool) -> Vec<String> {
    let mut outputs: Vec<String> = Vec::new();
    if prehash {
        outputs.push(PREHASH.to_string());
    }
    let mut named: Vec<String> = algorithms
        .iter()
        .flat_map(|list| parse_field_list(list))
        .collect();
    if named.is_empty() {
        named.push(DEFAULT_ALGORITHM.to_string());
    }
    outputs.extend(named);
    outputs
}

pub fn run(
    common: CanonicalArgs,
    algorithms: Vec<String>,
    prehash: bool,
    join: String,
    single: bool,
) -> Result<(), CliError> {
    let config = config_builder(&common)?
        .join_with(join)
        .outputs(requested_outputs(&algorithms, prehash))
        .build()?;
    if single {
        config.require_single_output()?;
    }
    let generator = EventHashGenerator::new(config);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if single {
        for_each_result(&common, &generator, |result| {
            writeln!(out, "{}", result.into_first().unwrap_or_default())?;
            Ok(())
        })?;
    } else {
        let mut results = Vec::new();
        for_each_result(&common, &generator, |result| {
            results.push(result);
            Ok(())
        })?;
        writeln!(out, "{}", output::format_results(&results)?)?;
    }
    Ok(())
}
