//! Stress tests for aodv-core
//!
//! These tests verify the sequence number counter and the channel writer
//! under concurrent access.

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use aodv_core::{
    ChannelWriter, MetricType, NodeAddress, NodeData, OutboundMessage, PacketData, PacketWriter,
    SeqNum, SequenceNumber, UnreachableNode, is_fresher,
};

fn make_addr(n: u16) -> NodeAddress {
    NodeAddress::new(std::net::Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, n))
}

#[test]
fn test_concurrent_sequence_number_advance() {
    // Every advance must hand out a distinct number
    const THREAD_COUNT: usize = 8;
    const ADVANCES_PER_THREAD: usize = 1_000;

    let counter = Arc::new(SequenceNumber::new());
    let start = Instant::now();

    let handles: Vec<_> = (0..THREAD_COUNT)
        .map(|_| {
            let counter = Arc::clone(&counter);
            thread::spawn(move || {
                (0..ADVANCES_PER_THREAD)
                    .map(|_| counter.advance().value())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut seen = HashSet::new();
    for handle in handles {
        for value in handle.join().expect("Thread should complete successfully") {
            assert!(seen.insert(value), "Sequence number {} handed out twice", value);
        }
    }

    let total = THREAD_COUNT * ADVANCES_PER_THREAD;
    println!("Advanced {} times in {:?}", total, start.elapsed());
    assert_eq!(seen.len(), total);
    assert_eq!(counter.current(), SeqNum::new(total as u16));
}

#[test]
fn test_full_wraparound_stays_fresher() {
    // Walking the whole 16-bit space, each number is fresher than the last
    let counter = SequenceNumber::new();
    let mut previous = counter.current();

    for _ in 0..=u16::MAX as u32 {
        let next = counter.advance();
        assert!(!next.is_unknown());
        assert!(is_fresher(next.value(), previous.value()));
        assert!(!is_fresher(previous.value(), next.value()));
        previous = next;
    }

    // Wrapped past 65535 straight to 1
    assert_eq!(counter.current(), SeqNum::new(1));
}

#[test]
fn test_concurrent_channel_writer() {
    const THREAD_COUNT: usize = 10;
    const MESSAGES_PER_THREAD: usize = 500;

    let (writer, mut rx) = ChannelWriter::new();
    let writer = Arc::new(writer);

    let handles: Vec<_> = (0..THREAD_COUNT)
        .map(|thread_id| {
            let writer = Arc::clone(&writer);
            thread::spawn(move || {
                let origin = make_addr(thread_id as u16 + 1);
                for i in 0..MESSAGES_PER_THREAD {
                    let packet = PacketData {
                        hop_limit: 20,
                        sender: origin,
                        metric_type: MetricType::HOP_COUNT,
                        orig_node: NodeData::new(origin, 0, SeqNum::new(i as u16 + 1)),
                        targ_node: NodeData::new(make_addr(999), 0, SeqNum::UNKNOWN),
                        timestamp: Instant::now(),
                    };
                    if i % 2 == 0 {
                        writer.send_route_request(&packet, NodeAddress::all_nodes_multicast());
                    } else {
                        writer.send_route_error(
                            &[UnreachableNode::new(make_addr(999), SeqNum::new(1))],
                            20,
                            NodeAddress::all_nodes_multicast(),
                        );
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread should complete successfully");
    }
    drop(writer);

    let (requests, errors) = tokio_test::block_on(async {
        let mut requests = 0;
        let mut errors = 0;
        while let Some(message) = rx.recv().await {
            match message {
                OutboundMessage::RouteRequest { .. } => requests += 1,
                OutboundMessage::RouteError { .. } => errors += 1,
                OutboundMessage::RouteReply { .. } => panic!("No replies were sent"),
            }
        }
        (requests, errors)
    });

    assert_eq!(requests, THREAD_COUNT * MESSAGES_PER_THREAD / 2);
    assert_eq!(errors, THREAD_COUNT * MESSAGES_PER_THREAD / 2);
}

#[test]
fn test_writer_survives_closed_channel() {
    let (writer, rx) = ChannelWriter::new();
    drop(rx);

    // Fire-and-forget: nothing to report, nothing panics
    writer.send_route_error(&[], 20, NodeAddress::all_nodes_multicast());
}
