use std::{
    fs::File,
    io::{Read, Seek, SeekFrom, Write},
    os::unix::io::AsFd,
    thread,
};

use compositor_core::transport::{Channel, TransportError};

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn buffer_file(contents: &[u8]) -> File {
    let mut file = tempfile::tempfile().unwrap();
    file.write_all(contents).unwrap();
    file
}

#[test]
fn messages_cross_threads_in_order() {
    init_logging();
    let (client, server) = Channel::pair().unwrap();

    let sender = thread::spawn(move || {
        for i in 0u32..32 {
            let header = i.to_le_bytes();
            if i % 2 == 0 {
                let file = buffer_file(format!("buffer {}", i).as_bytes());
                client.send(&header, &[file.as_fd()]).unwrap();
            } else {
                client.send(&header, &[]).unwrap();
            }
        }
    });

    for i in 0u32..32 {
        let fd_count = if i % 2 == 0 { 1 } else { 0 };
        let (header, fds) = server.receive(4, fd_count).unwrap();
        assert_eq!(header, i.to_le_bytes());
        assert_eq!(fds.len(), fd_count);

        if let Some(fd) = fds.into_iter().next() {
            let mut file = File::from(fd);
            file.seek(SeekFrom::Start(0)).unwrap();
            let mut contents = String::new();
            file.read_to_string(&mut contents).unwrap();
            assert_eq!(contents, format!("buffer {}", i));
        }
    }

    sender.join().unwrap();
}

#[test]
fn large_payload_is_reassembled() {
    init_logging();
    let (client, server) = Channel::pair().unwrap();
    let payload: Vec<u8> = (0..1024 * 1024).map(|i| (i % 251) as u8).collect();
    let expected = payload.clone();

    let sender = thread::spawn(move || {
        let fence = buffer_file(b"fence");
        client.send(&payload, &[fence.as_fd()]).unwrap();
    });

    let (received, fds) = server.receive(expected.len(), 1).unwrap();
    assert!(received == expected);
    assert_eq!(fds.len(), 1);
    sender.join().unwrap();
}

#[test]
fn hang_up_is_reported_as_disconnect() {
    init_logging();
    let (client, server) = Channel::pair().unwrap();

    let sender = thread::spawn(move || {
        client.send(b"par", &[]).unwrap();
        drop(client);
    });
    sender.join().unwrap();

    let err = server.receive(8, 0).unwrap_err();
    assert!(err.is_disconnect());
    assert!(matches!(err, TransportError::Disconnected(None)));
}
