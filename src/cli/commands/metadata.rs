//! Metadata command - resolve versions and persist the build identity

use crate::cli::args::MetadataArgs;
use crate::error::KrelResult;
use crate::metadata::{env_lines, MetadataBuilder};
use crate::resolve::{Resolver, VersionPins};

/// Execute the metadata command
pub fn execute(args: MetadataArgs) -> KrelResult<()> {
    // Pins are read here, once, and passed down explicitly; the
    // resolver itself never touches the process environment.
    let pins = VersionPins::from_env();
    let resolver = Resolver::new(pins);
    let builder = MetadataBuilder::new(&resolver);

    let metadata = builder.build(
        &args.device,
        &args.repo,
        &args.ref_name,
        &args.profiles_dir,
        &args.output_dir,
    )?;

    println!("{}", env_lines(&metadata.env));
    Ok(())
}
