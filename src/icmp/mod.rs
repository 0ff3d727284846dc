pub use echo::Echo;
pub use icmp4::IcmpV4Packet;
pub use icmp6::IcmpV6Packet;

pub mod icmp4;
pub mod icmp6;

mod echo;
