use std::{
    io::{IoSlice, IoSliceMut},
    os::unix::io::{AsFd, BorrowedFd, OwnedFd},
};

use rustix::{
    io::Errno,
    net::{
        recvmsg, send, sendmsg, RecvAncillaryBuffer, RecvAncillaryMessage, RecvFlags, SendAncillaryBuffer,
        SendAncillaryMessage, SendFlags,
    },
};
use tracing::{debug, trace, warn};

use super::TransportError;

/// Payload accompanying the descriptors of [`send_fds`]
///
/// Ancillary data cannot travel on its own over a stream socket.
pub(crate) const FD_PAYLOAD: &[u8; 2] = b"op";

fn map_errno(errno: Errno) -> TransportError {
    match errno {
        Errno::PIPE | Errno::CONNRESET => TransportError::Disconnected(Some(errno)),
        errno => TransportError::Socket(errno),
    }
}

/// Write all of `bytes`, retrying on interruption and short writes
pub(crate) fn send_all(socket: impl AsFd, mut bytes: &[u8]) -> Result<(), TransportError> {
    let socket = socket.as_fd();
    while !bytes.is_empty() {
        match send(socket, bytes, SendFlags::NOSIGNAL) {
            Ok(0) => return Err(TransportError::Disconnected(None)),
            Ok(sent) => bytes = &bytes[sent..],
            Err(Errno::INTR) => continue,
            Err(errno) => return Err(map_errno(errno)),
        }
    }
    Ok(())
}

/// Send file descriptors over a connected unix stream socket
///
/// All descriptors travel in a single control message, attached to a fixed two
/// byte payload that the peer has to consume through [`receive_data`] with the
/// same number of descriptors. Nothing at all is sent if `fds` is empty.
///
/// The descriptors are duplicated into the peer, the caller keeps ownership of its
/// own copies and may close them as soon as this returns.
pub fn send_fds(socket: impl AsFd, fds: &[BorrowedFd<'_>]) -> Result<(), TransportError> {
    if fds.is_empty() {
        return Ok(());
    }
    let socket = socket.as_fd();

    let mut space = vec![0; rustix::cmsg_space!(ScmRights(fds.len()))];
    let mut control = SendAncillaryBuffer::new(&mut space);
    if !control.push(SendAncillaryMessage::ScmRights(fds)) {
        return Err(TransportError::InvalidControlMessage);
    }

    let sent = loop {
        match sendmsg(
            socket,
            &[IoSlice::new(FD_PAYLOAD)],
            &mut control,
            SendFlags::NOSIGNAL,
        ) {
            Ok(sent) => break sent,
            Err(Errno::INTR) => continue,
            Err(errno) => return Err(map_errno(errno)),
        }
    };
    trace!(fds = fds.len(), "Sent file descriptors");

    // the descriptors left with the first byte, the peer still expects the rest
    send_all(socket, &FD_PAYLOAD[sent..])
}

/// Receive exactly `buffer.len()` bytes along with exactly `fd_count` descriptors
///
/// Bytes are accumulated over as many reads as needed. Control messages carrying
/// descriptors are collected in order; credential messages are ignored, any other
/// kind of control message fails the reception with
/// [`TransportError::InvalidControlMessage`]. Descriptors are received with
/// close-on-exec set.
///
/// The check for unknown kinds of control messages is only done on Linux and
/// Android, elsewhere they are skipped.
///
/// Errors:
/// - [`TransportError::ZeroLengthRequest`] if `buffer` is empty, before the socket
///   is touched,
/// - [`TransportError::Disconnected`] if the peer closed the connection,
/// - [`TransportError::TooManyFds`] as soon as more descriptors arrive than still
///   expected, or if the kernel had to truncate the control data,
/// - [`TransportError::TooFewFds`] if all bytes arrived but some descriptors did not.
///
/// Descriptors received before an error are closed.
pub fn receive_data(
    socket: impl AsFd,
    buffer: &mut [u8],
    fd_count: usize,
) -> Result<Vec<OwnedFd>, TransportError> {
    if buffer.is_empty() {
        return Err(TransportError::ZeroLengthRequest);
    }
    let socket = socket.as_fd();

    let mut fds = Vec::with_capacity(fd_count);
    let mut bytes_read = 0;

    while bytes_read < buffer.len() {
        // room for one more descriptor than expected, so an excess shows up as such
        let mut space = vec![0; control_space(fd_count - fds.len() + 1)];
        let mut control = RecvAncillaryBuffer::new(&mut space);

        let msg = match recvmsg(
            socket,
            &mut [IoSliceMut::new(&mut buffer[bytes_read..])],
            &mut control,
            RecvFlags::CMSG_CLOEXEC,
        ) {
            Ok(msg) => msg,
            Err(Errno::INTR) => continue,
            Err(errno) => return Err(map_errno(errno)),
        };

        if msg.bytes == 0 {
            debug!(bytes_read, expected = buffer.len(), "Peer closed the connection");
            return Err(TransportError::Disconnected(None));
        }
        bytes_read += msg.bytes;

        for message in control.drain() {
            match message {
                RecvAncillaryMessage::ScmRights(received) => fds.extend(received),
                #[cfg(any(target_os = "linux", target_os = "android"))]
                RecvAncillaryMessage::ScmCredentials(_) => {
                    warn!("Ignoring credentials control message");
                }
                _ => return Err(TransportError::InvalidControlMessage),
            }
        }
        drop(control);

        // the drain above silently skips the kinds it cannot decode
        #[cfg(any(target_os = "linux", target_os = "android"))]
        if let Some((level, kind)) = unexpected_control_message(aligned_control(&space)) {
            debug!(level, kind, "Unexpected control message");
            return Err(TransportError::InvalidControlMessage);
        }

        if msg
            .flags
            .intersects(RecvFlags::from_bits_retain(libc::MSG_CTRUNC as _))
            || fds.len() > fd_count
        {
            debug!(received = fds.len(), expected = fd_count, "Too many file descriptors");
            return Err(TransportError::TooManyFds);
        }
    }

    if fds.len() < fd_count {
        return Err(TransportError::TooFewFds {
            expected: fd_count,
            received: fds.len(),
        });
    }

    trace!(bytes = bytes_read, fds = fds.len(), "Received data");
    Ok(fds)
}

/// Size of a control buffer able to hold `fds` descriptors
///
/// On Linux and Android a socket with `SO_PASSCRED` set receives credentials along
/// with every message, they need room too or the kernel truncates the control data.
fn control_space(fds: usize) -> usize {
    #[cfg(any(target_os = "linux", target_os = "android"))]
    {
        rustix::cmsg_space!(ScmRights(fds), ScmCredentials(1))
    }
    #[cfg(not(any(target_os = "linux", target_os = "android")))]
    {
        rustix::cmsg_space!(ScmRights(fds))
    }
}

/// Part of a receive buffer where the kernel wrote the control messages
///
/// Mirrors the alignment [`RecvAncillaryBuffer`] applies to the buffer it is given.
#[cfg(any(target_os = "linux", target_os = "android"))]
fn aligned_control(space: &[u8]) -> &[u8] {
    let align = std::mem::align_of::<libc::cmsghdr>();
    let start = (space.as_ptr() as usize).wrapping_neg() % align;
    space.get(start..).unwrap_or_default()
}

/// Level and type of the first control message that neither carries descriptors
/// nor credentials
///
/// `control` must start on a message header and be zeroed past the last message.
#[cfg(any(target_os = "linux", target_os = "android"))]
fn unexpected_control_message(mut control: &[u8]) -> Option<(i32, i32)> {
    const WORD: usize = std::mem::size_of::<usize>();
    let header_len = std::mem::size_of::<libc::cmsghdr>();

    while control.len() >= header_len {
        let len = usize::from_ne_bytes(control[..WORD].try_into().ok()?);
        if len < header_len {
            break;
        }
        let level = i32::from_ne_bytes(control[WORD..WORD + 4].try_into().ok()?);
        let kind = i32::from_ne_bytes(control[WORD + 4..WORD + 8].try_into().ok()?);
        match (level, kind) {
            (libc::SOL_SOCKET, libc::SCM_RIGHTS) | (libc::SOL_SOCKET, libc::SCM_CREDENTIALS) => {}
            other => return Some(other),
        }
        // headers are padded to the native word
        control = control.get((len + WORD - 1) & !(WORD - 1)..)?;
    }
    None
}
