use std::{error::Error, io, process};
use wua_report::{Report, WindowsUpdateAgent};

fn main() {
    env_logger::init();

    if let Err(why) = Report::new(io::stdout()).run(&WindowsUpdateAgent) {
        let mut error = format!("wua-report errored: {}", why);
        let mut cause = why.source();
        while let Some(why) = cause {
            error.push_str(&format!("\n    caused by: {}", why));
            cause = why.source();
        }

        eprintln!("{}", error);
        process::exit(1);
    }
}
