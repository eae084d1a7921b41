use crate::cmd::StatusArgs;
use crate::exit::{relay_error, CliResult, SUCCESS};
use crate::output::{print_states, OutputFormat};

pub fn run(args: StatusArgs, format: OutputFormat) -> CliResult<i32> {
    let mut client = args.conn.open()?;
    let states = client
        .get_all()
        .map_err(|err| relay_error("status failed", err))?;
    client.disconnect();

    print_states(&args.conn.host, &states, format);
    Ok(SUCCESS)
}
