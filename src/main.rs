use std::io::{stdout, Write};
use std::process::exit;
use std::sync::Arc;
use anyhow::Result;
use gumdrop::Options;
use log::{debug, error};
use tokio::signal::unix::{signal, SignalKind};
use multiping::{Cancel, Pinger, Scheduler};
use args::{usage, Args};

mod args;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let argv = std::env::args().skip(1).collect::<Vec<_>>();
    let args = match Args::parse_args_default(&argv) {
        Ok(args) => args,
        Err(e)   => {
            println!("{}", e);
            exit(2);
        }
    };

    if args.help {
        println!("{}", usage());
        return Ok(());
    }

    let targets = args.targets();
    if targets.is_empty() {
        println!("Must specify target");
        println!("{}", usage());
        exit(1);
    }

    let cancel = Cancel::new();
    interrupt(cancel.clone())?;

    let pinger = Arc::new(Pinger::new()?);
    let sched  = Scheduler::new(pinger, targets, args.config(), cancel);

    println!("Sending ping(s)....");

    let rounds = sched.run(|round| {
        let mut out = stdout().lock();
        writeln!(out, "{}", round)?;
        out.flush()?;
        Ok(())
    }).await?;

    debug!("finished after {} rounds", rounds);
    println!("Finished");

    Ok(())
}

fn interrupt(cancel: Cancel) -> Result<()> {
    let mut interrupt = signal(SignalKind::interrupt())?;

    tokio::spawn(async move {
        match interrupt.recv().await {
            Some(()) => cancel.cancel(),
            None     => error!("interrupt listener closed"),
        }
    });

    Ok(())
}
