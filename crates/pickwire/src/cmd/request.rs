use std::time::Duration;

use pickwire_frame::{CodecConfig, IntDecoding};
use pickwire_session::{connect_with_config, Arg, Request, SessionConfig};
use tracing::debug;

use crate::cmd::{ConnectionArgs, RequestArgs};
use crate::exit::{session_error, CliError, CliResult, CONTROLLER_ERROR, SUCCESS, USAGE};
use crate::output::{print_response, OutputFormat};

pub fn run(args: RequestArgs, connection: &ConnectionArgs, format: OutputFormat) -> CliResult<i32> {
    let request = build_request(&args)?;
    let config = session_config(connection)?;

    let mut session = connect_with_config(&connection.addr, &config)
        .map_err(|err| session_error("connect failed", err))?;

    let response = if request.action().is_two_phase() {
        debug!(action = %request.action(), "triggering two-phase request");
        session
            .trigger(&request)
            .map_err(|err| session_error("send failed", err))?;
        session.wait_for_result()
    } else {
        session.request(&request)
    }
    .map_err(|err| session_error("request failed", err))?;

    print_response(&response, format);

    if let Err(err) = session.close() {
        debug!(error = %err, "close failed after response");
    }

    if response.is_error() {
        return Ok(CONTROLLER_ERROR);
    }
    Ok(SUCCESS)
}

fn build_request(args: &RequestArgs) -> CliResult<Request> {
    let mut request_args: Vec<Arg> = args.ints.iter().copied().map(Arg::Int).collect();
    for vector in &args.floats {
        request_args.push(Arg::Floats(parse_floats(vector)?));
    }
    Request::build(args.action, &request_args)
        .map_err(|err| session_error("invalid request", err))
}

fn session_config(connection: &ConnectionArgs) -> CliResult<SessionConfig> {
    let timeout = parse_duration(&connection.timeout)?;
    Ok(SessionConfig {
        brand: connection.brand.clone(),
        connect_timeout: Some(timeout),
        codec: CodecConfig {
            int_decoding: if connection.legacy_int24 {
                IntDecoding::Low24
            } else {
                IntDecoding::Full
            },
            read_timeout: Some(timeout),
            write_timeout: Some(timeout),
            ..CodecConfig::default()
        },
    })
}

fn parse_floats(input: &str) -> CliResult<Vec<f32>> {
    input
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<f32>()
                .map_err(|_| CliError::new(USAGE, format!("invalid float value: {part}")))
        })
        .collect()
}

fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}
