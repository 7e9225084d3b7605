use pickwire_frame::{DEFAULT_MAX_PAYLOAD, MAGIC};
use pickwire_session::DEFAULT_BRAND;

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("pickwire {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: pickwire");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "target: {}",
        option_env!("PICKWIRE_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!(
        "protocol_magic: {:?}",
        [MAGIC[0], MAGIC[4], MAGIC[8]]
    );
    println!("brand: {DEFAULT_BRAND}");
    println!("max_payload: {DEFAULT_MAX_PAYLOAD}");
    println!(
        "features: session={}, cli=true",
        cfg!(feature = "session")
    );

    Ok(SUCCESS)
}
