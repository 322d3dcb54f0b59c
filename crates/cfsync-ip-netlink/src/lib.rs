// # Netlink IP Source
//
// This crate provides the stable IPv6 source for cfsync on Linux systems.
//
// ## Behavior
//
// One `RTM_GETADDR` dump (AF_INET6) per call over a blocking rtnetlink
// socket, run on the blocking thread pool. From the dump, the first address
// in kernel report order is chosen that:
//
// - belongs to the configured interface
// - has universe (global) scope
// - is not a privacy/temporary address (`IFA_F_TEMPORARY`)
// - is not link-local (`fe80::/10`)
//
// Temporary addresses rotate several times a day, so publishing one in DNS
// would leave the record stale within hours.
//
// ## Platform Support
//
// Netlink is Linux-specific. On other platforms the source still builds but
// every lookup returns an error.

use cfsync_core::traits::{IpSource, IpVersion};
use cfsync_core::{Error, Result};

use std::net::{IpAddr, Ipv6Addr};

/// `RT_SCOPE_UNIVERSE` from `linux/rtnetlink.h`
pub const SCOPE_UNIVERSE: u8 = 0;

/// `IFA_F_TEMPORARY` from `linux/if_addr.h`
pub const FLAG_TEMPORARY: u32 = 0x01;

/// One IPv6 address entry as reported by the kernel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterfaceAddress {
    /// Interface index the address is assigned to
    pub index: u32,
    /// The address itself
    pub address: Ipv6Addr,
    /// Address scope (`RT_SCOPE_*`)
    pub scope: u8,
    /// Address flags (`IFA_F_*`)
    pub flags: u32,
}

impl InterfaceAddress {
    fn is_permanent_global(&self) -> bool {
        self.scope == SCOPE_UNIVERSE
            && self.flags & FLAG_TEMPORARY == 0
            && !is_link_local(&self.address)
    }
}

/// fe80::/10
fn is_link_local(address: &Ipv6Addr) -> bool {
    address.segments()[0] & 0xffc0 == 0xfe80
}

/// Pick the first permanent global address of interface `index`
///
/// Order of `addresses` is preserved, so the result is the first match in
/// kernel report order.
pub fn select_permanent_global(addresses: &[InterfaceAddress], index: u32) -> Option<Ipv6Addr> {
    addresses
        .iter()
        .filter(|entry| entry.index == index)
        .find(|entry| entry.is_permanent_global())
        .map(|entry| entry.address)
}

/// IPv6 source reading a named interface via rtnetlink
#[derive(Debug, Clone)]
pub struct NetlinkIpSource {
    interface: String,
}

impl NetlinkIpSource {
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
        }
    }
}

#[async_trait::async_trait]
impl IpSource for NetlinkIpSource {
    async fn current(&self) -> Result<IpAddr> {
        let interface = self.interface.clone();
        // The blocking pool thread does not inherit a scoped subscriber
        let dispatch = tracing::dispatcher::get_default(|current| current.clone());

        let address = tokio::task::spawn_blocking(move || {
            tracing::dispatcher::with_default(&dispatch, || sys::lookup(&interface))
        })
        .await
        .map_err(|e| Error::ip_source(format!("Address lookup task failed: {}", e)))??;

        tracing::debug!("Interface {} resolved to {}", self.interface, address);
        Ok(IpAddr::V6(address))
    }

    fn version(&self) -> IpVersion {
        IpVersion::V6
    }

    fn describe(&self) -> String {
        format!("interface {}", self.interface)
    }
}

#[cfg(target_os = "linux")]
mod sys {
    use super::{InterfaceAddress, select_permanent_global};
    use cfsync_core::{Error, Result};

    use netlink_packet_core::{
        NLM_F_DUMP, NLM_F_REQUEST, NetlinkHeader, NetlinkMessage, NetlinkPayload,
    };
    use netlink_packet_route::address::Nla;
    use netlink_packet_route::{AF_INET6, AddressMessage, RtnlMessage};
    use netlink_sys::{Socket, SocketAddr, protocols::NETLINK_ROUTE};

    use std::ffi::CString;
    use std::net::Ipv6Addr;

    const RECV_BUFFER_SIZE: usize = 32 * 1024;

    /// Resolve the interface and pick its permanent global IPv6 address
    pub(super) fn lookup(interface: &str) -> Result<Ipv6Addr> {
        let index = interface_index(interface)?;
        let addresses = dump_ipv6_addresses()?;

        tracing::debug!(
            "Kernel reported {} IPv6 addresses, interface {} has index {}",
            addresses.len(),
            interface,
            index
        );

        select_permanent_global(&addresses, index).ok_or_else(|| {
            Error::ip_source(format!(
                "No permanent global IPv6 address found on interface {}",
                interface
            ))
        })
    }

    fn interface_index(interface: &str) -> Result<u32> {
        let name = CString::new(interface)
            .map_err(|_| Error::ip_source(format!("Invalid interface name: {:?}", interface)))?;

        // SAFETY: `name` is a valid NUL-terminated string for the duration of the call
        let index = unsafe { libc::if_nametoindex(name.as_ptr()) };
        if index == 0 {
            return Err(Error::ip_source(format!("Interface {} not found", interface)));
        }
        Ok(index)
    }

    fn dump_ipv6_addresses() -> Result<Vec<InterfaceAddress>> {
        let mut socket = Socket::new(NETLINK_ROUTE)?;
        socket.bind_auto()?;
        socket.connect(&SocketAddr::new(0, 0))?;

        let mut request = AddressMessage::default();
        request.header.family = AF_INET6 as u8;

        let mut header = NetlinkHeader::default();
        header.flags = NLM_F_REQUEST | NLM_F_DUMP;

        let mut packet = NetlinkMessage::new(
            header,
            NetlinkPayload::InnerMessage(RtnlMessage::GetAddress(request)),
        );
        packet.finalize();

        let mut send_buf = vec![0u8; packet.buffer_len()];
        packet.serialize(&mut send_buf[..]);
        socket.send(&send_buf[..], 0)?;

        let mut addresses = Vec::new();
        let mut recv_buf = vec![0u8; RECV_BUFFER_SIZE];

        loop {
            let size = socket.recv(&mut &mut recv_buf[..], 0)?;
            let mut offset = 0;

            while offset < size {
                let message = NetlinkMessage::<RtnlMessage>::deserialize(&recv_buf[offset..size])
                    .map_err(|e| Error::ip_source(format!("Malformed netlink message: {}", e)))?;

                match message.payload {
                    NetlinkPayload::Done(_) => return Ok(addresses),
                    NetlinkPayload::Error(err) => {
                        return Err(Error::ip_source(format!("Address dump failed: {:?}", err)));
                    }
                    NetlinkPayload::InnerMessage(RtnlMessage::NewAddress(msg)) => {
                        if let Some(entry) = to_interface_address(&msg) {
                            addresses.push(entry);
                        }
                    }
                    _ => {}
                }

                let length = message.header.length as usize;
                if length == 0 {
                    break;
                }
                offset += length;
            }
        }
    }

    fn to_interface_address(msg: &AddressMessage) -> Option<InterfaceAddress> {
        if msg.header.family != AF_INET6 as u8 {
            return None;
        }

        let mut address = None;
        let mut local = None;
        // IFA_FLAGS carries the full 32-bit set; the header only has the low byte
        let mut flags = u32::from(msg.header.flags);

        for nla in &msg.nlas {
            match nla {
                Nla::Address(bytes) => address = to_ipv6(bytes),
                Nla::Local(bytes) => local = to_ipv6(bytes),
                Nla::Flags(value) => flags = *value,
                _ => {}
            }
        }

        Some(InterfaceAddress {
            index: msg.header.index,
            address: address.or(local)?,
            scope: msg.header.scope,
            flags,
        })
    }

    fn to_ipv6(bytes: &[u8]) -> Option<Ipv6Addr> {
        <[u8; 16]>::try_from(bytes).ok().map(Ipv6Addr::from)
    }
}

#[cfg(not(target_os = "linux"))]
mod sys {
    use cfsync_core::{Error, Result};
    use std::net::Ipv6Addr;

    pub(super) fn lookup(interface: &str) -> Result<Ipv6Addr> {
        Err(Error::ip_source(format!(
            "Interface address lookup for {} is only supported on Linux",
            interface
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(index: u32, address: &str, scope: u8, flags: u32) -> InterfaceAddress {
        InterfaceAddress {
            index,
            address: address.parse().unwrap(),
            scope,
            flags,
        }
    }

    const SCOPE_LINK: u8 = 253;

    #[test]
    fn test_skips_link_local_and_temporary() {
        let addresses = [
            entry(2, "fe80::1", SCOPE_LINK, 0x80),
            entry(2, "2001:db8::abcd:1234", SCOPE_UNIVERSE, FLAG_TEMPORARY),
            entry(2, "2001:db8::10", SCOPE_UNIVERSE, 0x80),
        ];

        assert_eq!(
            select_permanent_global(&addresses, 2),
            Some("2001:db8::10".parse().unwrap())
        );
    }

    #[test]
    fn test_only_link_local_and_temporary_yields_none() {
        let addresses = [
            entry(2, "fe80::1", SCOPE_LINK, 0x80),
            entry(2, "2001:db8::abcd:1234", SCOPE_UNIVERSE, FLAG_TEMPORARY),
        ];

        assert_eq!(select_permanent_global(&addresses, 2), None);
    }

    #[test]
    fn test_first_match_in_report_order_wins() {
        let addresses = [
            entry(2, "2001:db8::20", SCOPE_UNIVERSE, 0),
            entry(2, "2001:db8::10", SCOPE_UNIVERSE, 0),
        ];

        assert_eq!(
            select_permanent_global(&addresses, 2),
            Some("2001:db8::20".parse().unwrap())
        );
    }

    #[test]
    fn test_other_interfaces_ignored() {
        let addresses = [
            entry(3, "2001:db8::99", SCOPE_UNIVERSE, 0),
            entry(2, "fe80::1", SCOPE_LINK, 0),
        ];

        assert_eq!(select_permanent_global(&addresses, 2), None);
    }

    #[test]
    fn test_link_local_with_global_scope_still_excluded() {
        let addresses = [entry(2, "febf::1", SCOPE_UNIVERSE, 0)];
        assert_eq!(select_permanent_global(&addresses, 2), None);
    }

    #[test]
    fn test_no_addresses() {
        assert_eq!(select_permanent_global(&[], 1), None);
    }

    #[test]
    fn test_source_metadata() {
        let source = NetlinkIpSource::new("eth0");
        assert_eq!(source.version(), IpVersion::V6);
        assert_eq!(source.describe(), "interface eth0");
    }

    #[tokio::test]
    async fn test_unknown_interface_is_error() {
        let source = NetlinkIpSource::new("cfsync-missing0");
        let err = source.current().await.unwrap_err();
        assert!(matches!(err, Error::IpSource(_)));
    }
}
