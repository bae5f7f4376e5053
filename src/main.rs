use clap::Parser;
use nvu::cli::{Cli, CommandHandler};
use nvu::core::constants::{exit, version::APP_NAME};
use nvu::core::{DispatchContext, Invocation, ProcessDispatcher, Router};
use nvu::infrastructure::{init_logging, SystemRunner};
use std::env;
use std::process;

fn main() {
    init_logging();

    let invocation = Invocation::from_argv(env::args_os().collect());

    let ctx = match DispatchContext::from_process() {
        Ok(ctx) => ctx,
        Err(e) => {
            eprint!("{}", e.user_message(APP_NAME));
            process::exit(exit::FAILURE);
        }
    };
    let dispatcher = ProcessDispatcher::for_host();

    if invocation.command == ctx.profile.tool_name {
        let cli = match Cli::try_parse_from(&invocation.argv) {
            Ok(cli) => cli,
            Err(e) => e.exit(),
        };

        let handler = CommandHandler::new(&ctx, dispatcher);
        if let Err(e) = handler.handle_command(cli.command) {
            eprint!("{}", e.user_message(&ctx.profile.tool_name));
            process::exit(exit::FAILURE);
        }
        return;
    }

    let code = Router::new(&ctx).run(&invocation, &dispatcher, &SystemRunner);
    process::exit(code);
}
