use clap::Parser;
use metria::cli::{Cli, Commands};
use miette::Result;

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) for proper Unix piping.
    // Without this, piping to `head`, `grep -q`, etc. causes a panic on broken pipe.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    // Install miette's fancy error handler for beautiful diagnostics
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;

    match cli.command {
        Commands::Init(args) => metria::cli::commands::init::run(args),
        Commands::Est(cmd) => metria::cli::commands::est::run(cmd, &global),
        Commands::Cmp(cmd) => metria::cli::commands::cmp::run(cmd, &global),
        Commands::Plan(cmd) => metria::cli::commands::plan::run(cmd, &global),
        Commands::Cycle(cmd) => metria::cli::commands::cycle::run(cmd, &global),
        Commands::Formula(cmd) => metria::cli::commands::formula::run(cmd, &global),
        Commands::Validate(args) => metria::cli::commands::validate::run(args),
        Commands::Report(cmd) => metria::cli::commands::report::run(cmd, &global),
        Commands::Completions(args) => metria::cli::commands::completions::run(args),
    }
}
