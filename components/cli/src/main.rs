use std::ffi::OsString;

use console::Style;

fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("error")).init();

    let args = std::env::args_os().collect::<Vec<OsString>>();

    if args.len() != 2 {
        print_help();
        return Ok(());
    }

    let Some(input_csv) = args[1].to_str() else {
        eprintln!("{}: incorrect CLI arg", Style::new().red().bold().apply_to("ERR"));
        std::process::exit(2);
    };

    let file = match std::fs::File::open(input_csv) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("{}: {}: {}", Style::new().red().bold().apply_to("ERR"), input_csv, e);
            std::process::exit(2);
        },
    };

    // BETLOG_LEDGER selects a durable ledger file, otherwise the rows land
    // on stdout
    let result = match std::env::var("BETLOG_LEDGER") {
        Ok(path) => {
            log::info!("recording to ledger file {path}");
            recorder::process_messages_to_file(file, std::path::Path::new(&path))
        },
        Err(_) => recorder::process_messages(file, &mut std::io::stdout()),
    };

    match result {
        Ok(summary) => {
            eprintln!(
                "{}: {} appended, {} duplicates, {} rejected",
                Style::new().green().bold().apply_to("OK"),
                summary.appended,
                summary.duplicates,
                summary.rejected
            );
            Ok(())
        },
        Err(e) => {
            eprintln!("{}: {:?}", Style::new().red().bold().apply_to("ERR"), e);
            std::process::exit(1);
        },
    }
}

fn print_help() {
    println!("Usage:\n   cargo run -- <messages.csv> > <ledger.csv>");
}
