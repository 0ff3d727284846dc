use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;
use gumdrop::Options;
use multiping::{ping, Config};

#[derive(Debug, Options)]
pub struct Args {
    #[options(help = "print this message")]
    pub help:     bool,
    #[options(short = "l", meta = "size", default = "32", parse(try_from_str = "size"),
              help = "send buffer size, at most 65500")]
    pub size:     u32,
    #[options(short = "f", help = "set don't fragment flag in packet (IPv4 only)")]
    pub fragment: bool,
    #[options(short = "i", meta = "TTL", default = "64", parse(try_from_str = "ttl"),
              help = "time to live (64 default)")]
    pub ttl:      u8,
    #[options(short = "r", meta = "rate", default = "1000", parse(try_from_str = "rate"),
              help = "rate of pings in milliseconds (1000 default)")]
    pub rate:     u64,
    #[options(short = "w", meta = "timeout", default = "4000", parse(try_from_str = "timeout"),
              help = "timeout in milliseconds to wait for each reply (4000 default)")]
    pub timeout:  u64,
    #[options(free, help = "target_name[,target2_name][,targetXXX_name]")]
    pub targets:  Vec<String>,
}

impl Args {
    pub fn targets(&self) -> Vec<String> {
        self.targets.iter()
            .flat_map(|list| list.split(','))
            .map(str::trim)
            .filter(|host| !host.is_empty())
            .map(str::to_owned)
            .collect()
    }

    pub fn config(&self) -> Config {
        Config {
            size:    self.size,
            expiry:  Duration::from_millis(self.timeout),
            rate:    Duration::from_millis(self.rate),
            options: ping::Options {
                ttl:           self.ttl,
                dont_fragment: self.fragment,
            },
        }
    }
}

pub fn usage() -> String {
    [
        "Usage: multiping [-l size] [-f] [-i TTL] [-r rate]",
        "                 [-w timeout] target_name[,target2_name][,targetXXX_name]",
        "",
        "Options:",
        Args::usage(),
    ].join("\n")
}

fn size(s: &str) -> Result<u32, String> {
    number(s, "send buffer size")
}

fn ttl(s: &str) -> Result<u8, String> {
    number(s, "TTL")
}

fn rate(s: &str) -> Result<u64, String> {
    number(s, "rate")
}

fn timeout(s: &str) -> Result<u64, String> {
    number(s, "timeout")
}

fn number<T: FromStr>(s: &str, what: &str) -> Result<T, String> where T::Err: Display {
    s.parse().map_err(|e| format!("unable to parse value for {}: {}", what, e))
}
