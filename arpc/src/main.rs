use arp_rs_afpacket;
use arp_rs_runtime::Result;
use clap::{value_t_or_exit, App, Arg, ArgMatches};
use std::net::Ipv4Addr;
use std::process;
use std::time::{Duration, Instant};
use tracing::{debug, Level};

mod subscriber;
use subscriber::StderrSubscriber;

fn app<'a, 'b>() -> App<'a, 'b> {
    App::new("arpc")
        .version("0.1.0")
        .about("Resolves an IPv4 address to a hardware address with ARP")
        .arg(
            Arg::with_name("interface")
                .short("i")
                .long("interface")
                .value_name("IFACE")
                .help("Network interface to send the request from")
                .takes_value(true)
                .default_value("eth0"),
        )
        .arg(
            Arg::with_name("ip")
                .long("ip")
                .value_name("IPV4_ADDR")
                .help("IPv4 address to resolve")
                .takes_value(true)
                .required(true)
                .validator(|ip| {
                    ip.parse::<Ipv4Addr>()
                        .map(|_| ())
                        .map_err(|_| format!("{} is not an IPv4 address", ip))
                }),
        )
        .arg(
            Arg::with_name("timeout")
                .short("t")
                .long("timeout")
                .value_name("MILLIS")
                .help("How long to wait for a reply, in milliseconds")
                .takes_value(true)
                .default_value("1000")
                .validator(|t| {
                    t.parse::<u64>()
                        .map(|_| ())
                        .map_err(|_| format!("{} is not a number of milliseconds", t))
                }),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .multiple(true)
                .help("Log more; repeat for more detail"),
        )
}

fn log_level(verbosity: u64) -> Level {
    match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

async fn resolve(iface: &str, ip: Ipv4Addr, timeout: Duration) -> Result<()> {
    let client = arp_rs_afpacket::dial(iface)?;
    debug!(
        "resolving {} from {} ({}) on {}",
        ip,
        client.ip(),
        client.hardware_addr(),
        iface
    );
    client.set_deadline(Some(Instant::now() + timeout))?;
    let resolved = client.resolve(ip).await;
    client.close()?;

    println!("{} -> {}", ip, resolved?);
    Ok(())
}

async fn run(matches: &ArgMatches<'_>) -> i32 {
    let iface = matches.value_of("interface").unwrap_or("eth0");
    let ip = value_t_or_exit!(matches, "ip", Ipv4Addr);
    let timeout = Duration::from_millis(value_t_or_exit!(matches, "timeout", u64));

    match resolve(iface, ip, timeout).await {
        Ok(()) => 0,
        Err(e) if e.is_timeout() => {
            eprintln!(
                "arpc: no reply from {} within {}ms",
                ip,
                timeout.as_millis()
            );
            1
        }
        Err(e) => {
            eprintln!("arpc: {}", e);
            1
        }
    }
}

#[tokio::main]
async fn main() {
    let matches = app().get_matches();

    let subscriber = StderrSubscriber::new(log_level(matches.occurrences_of("verbose")));
    tracing::subscriber::set_global_default(subscriber).expect("setting tracing default failed");

    process::exit(run(&matches).await);
}
