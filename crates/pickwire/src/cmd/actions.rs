use pickwire_session::ActionRequest;

use crate::cmd::ActionsArgs;
use crate::exit::{CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_actions, OutputFormat};

pub fn run(args: ActionsArgs, format: OutputFormat) -> CliResult<i32> {
    let family = args.family.as_deref().map(str::to_ascii_lowercase);
    if let Some(family) = &family {
        let known = ActionRequest::ALL
            .iter()
            .any(|action| action.family().name() == family);
        if !known {
            return Err(CliError::new(
                USAGE,
                format!("unknown family '{family}' (binpicking, locator, calibration, solution)"),
            ));
        }
    }

    let actions: Vec<ActionRequest> = ActionRequest::ALL
        .into_iter()
        .filter(|action| {
            family
                .as_deref()
                .is_none_or(|family| action.family().name() == family)
        })
        .collect();
    print_actions(&actions, format);
    Ok(SUCCESS)
}
