//! Command implementations.

pub mod canonicalize;
pub mod hash;

use eventhash_canonical::{CbvVersion, DigestResult, HashConfig, HashConfigBuilder};
use eventhash_reader::{EventHashGenerator, ReaderError};

use crate::errors::CliError;
use crate::input::{self, Format};
use crate::CanonicalArgs;

/// Builder seeded from the flags shared by every command.
fn config_builder(common: &CanonicalArgs) -> Result<HashConfigBuilder, CliError> {
    let version: CbvVersion = common.cbv.parse()?;
    let mut builder = HashConfig::builder().version(version);
    if common.no_default_excludes {
        builder = builder.clear_excluded_fields();
    }
    if let Some(list) = &common.exclude {
        builder = builder.exclude_fields(list);
    }
    Ok(builder)
}

/// Runs the generator over the command's input, handing every result to `sink`.
fn for_each_result<F>(
    common: &CanonicalArgs,
    generator: &EventHashGenerator,
    mut sink: F,
) -> Result<usize, CliError>
where
    F: FnMut(DigestResult) -> Result<(), CliError>,
{
    let mut reader = input::open(common.input.as_deref())?;
    let format = input::detect(reader.as_mut(), common.format)?;
    let results: Box<dyn Iterator<Item = Result<DigestResult, ReaderError>> + '_> = match format {
        Format::Xml => Box::new(generator.from_xml(reader)),
        Format::Json | Format::Auto => Box::new(generator.from_json(reader)),
    };

    let mut count = 0;
    for result in results {
        sink(result?)?;
        count += 1;
    }
    tracing::info!(events = count, ?format, "processed input");
    Ok(count)
}
