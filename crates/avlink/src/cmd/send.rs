use std::time::{Duration, Instant};

use avlink_frame::{flush, pump, CommandFrame, Session};
use avlink_transport::Transport;

use crate::cmd::{connector, parse_duration, SendArgs};
use crate::exit::{frame_error, transport_error, CliError, CliResult, SUCCESS, TIMEOUT};
use crate::output::{print_frame, OutputFormat};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let wait_timeout = parse_duration(&args.wait_timeout)?;
    let mut connector = connector()?;
    let mut transport = connector
        .open(&args.address)
        .map_err(|err| transport_error("open failed", err))?;

    let frame = CommandFrame {
        id: args.id,
        args: args.args.clone(),
    };
    tracing::debug!(address = %args.address, %frame, "sending");

    let mut session = Session::new();
    session.send(&frame);
    let deadline = Instant::now() + wait_timeout;
    while session.pending_egress() > 0 {
        flush(transport.as_mut(), &mut session).map_err(|err| frame_error("send failed", err))?;
        if session.pending_egress() > 0 {
            if Instant::now() >= deadline {
                return Err(CliError::new(TIMEOUT, "device did not accept the frame"));
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }

    if args.wait {
        let reply = wait_for_frame(transport.as_mut(), &mut session, deadline)?;
        print_frame(&reply, format);
    }

    Ok(SUCCESS)
}

fn wait_for_frame(
    transport: &mut dyn Transport,
    session: &mut Session,
    deadline: Instant,
) -> CliResult<CommandFrame> {
    loop {
        pump(transport, session).map_err(|err| frame_error("receive failed", err))?;
        if let Some(frame) = session.next_frame() {
            return Ok(frame);
        }
        if Instant::now() >= deadline {
            return Err(CliError::new(TIMEOUT, "no frame received before timeout"));
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}
