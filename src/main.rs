use log::error;
use simplelog::{Config, TermLogger, TerminalMode};
use speed_map::cli::Cli;
use structopt::StructOpt;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let opt = Cli::from_args();
    let config = opt.load_config()?;
    let level_filter = opt.verbosity(config.log_level());
    TermLogger::init(level_filter, Config::default(), TerminalMode::Mixed)?;

    if let Err(e) = opt.execute(config) {
        error!("{}", e);
        return Err(e);
    }

    Ok(())
}
