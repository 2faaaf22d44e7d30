use std::net::Ipv4Addr;

use crate::net::{EngineError, NetWorld, NodeId};
use crate::topo::{build_adhoc, build_point_to_point_pairs, AdhocOpts, PointToPointOpts};

#[test]
fn point_to_point_pairs_get_one_subnet_each() {
    let mut world = NetWorld::default();
    let ids = build_point_to_point_pairs(&mut world, 4, &PointToPointOpts::default())
        .expect("build p2p");
    assert_eq!(ids, vec![NodeId(0), NodeId(1), NodeId(2), NodeId(3)]);

    let net = &mut world.net;
    assert_eq!(net.address(ids[0]), Some(Ipv4Addr::new(10, 1, 1, 1)));
    assert_eq!(net.address(ids[1]), Some(Ipv4Addr::new(10, 1, 1, 2)));
    assert_eq!(net.address(ids[2]), Some(Ipv4Addr::new(10, 1, 2, 1)));
    assert_eq!(net.address(ids[3]), Some(Ipv4Addr::new(10, 1, 2, 2)));

    assert!(net.link_between(ids[0], ids[1]).is_some());
    assert!(net.link_between(ids[1], ids[0]).is_some());
    assert!(net.link_between(ids[1], ids[2]).is_none());
    assert!(net.route_exists(ids[0], ids[1]));
    assert!(!net.route_exists(ids[0], ids[2]));
}

#[test]
fn point_to_point_error_rate_applies_to_both_directions() {
    let mut world = NetWorld::default();
    let opts = PointToPointOpts {
        error_rate: 0.25,
        ..PointToPointOpts::default()
    };
    build_point_to_point_pairs(&mut world, 2, &opts).expect("build p2p");
    let net = &world.net;
    for (a, b) in [(0, 1), (1, 0)] {
        let id = net.link_between(NodeId(a), NodeId(b)).expect("link");
        assert_eq!(net.link(id).expect("link").error_rate, 0.25);
    }
}

#[test]
fn adhoc_nodes_share_one_channel_and_subnet() {
    let mut world = NetWorld::default();
    let opts = AdhocOpts {
        default_loss_db: 200.0,
        pair_loss_db: vec![(0, 1, 50.0), (0, 2, 50.0)],
        ..AdhocOpts::default()
    };
    let (ids, ch) = build_adhoc(&mut world, 3, &opts).expect("build adhoc");
    let net = &mut world.net;

    assert_eq!(net.address(ids[0]), Some(Ipv4Addr::new(10, 0, 0, 1)));
    assert_eq!(net.address(ids[2]), Some(Ipv4Addr::new(10, 0, 0, 3)));
    assert_eq!(net.node_by_address(Ipv4Addr::new(10, 0, 0, 2)), Some(ids[1]));

    let channel = net.channel(ch).expect("channel");
    assert_eq!(channel.members().count(), 3);
    assert_eq!(channel.loss.loss(ids[1], ids[0]), 50.0);
    assert_eq!(channel.loss.loss(ids[1], ids[2]), 200.0);
    assert_eq!(channel.max_loss_db, 110.0);
    assert!(net.route_exists(ids[1], ids[0]));
}

#[test]
fn adhoc_rejects_loss_entries_for_missing_nodes() {
    let mut world = NetWorld::default();
    let opts = AdhocOpts {
        pair_loss_db: vec![(0, 5, 50.0)],
        ..AdhocOpts::default()
    };
    let err = build_adhoc(&mut world, 2, &opts).expect_err("node 5 does not exist");
    assert_eq!(err, EngineError::UnknownNode(NodeId(5)));
}

#[test]
fn duplicate_addresses_and_links_are_rejected() {
    let mut world = NetWorld::default();
    build_point_to_point_pairs(&mut world, 2, &PointToPointOpts::default()).expect("build p2p");
    let net = &mut world.net;
    let extra = net.add_host("extra");
    let err = net
        .assign_address(extra, Ipv4Addr::new(10, 1, 1, 1))
        .expect_err("address taken");
    assert!(matches!(err, EngineError::DuplicateAddress { owner: NodeId(0), .. }));

    let rate = PointToPointOpts::default().data_rate;
    let err = net
        .connect_p2p(NodeId(1), NodeId(0), rate, Default::default())
        .expect_err("already linked");
    assert_eq!(err, EngineError::DuplicateLink(NodeId(1), NodeId(0)));
}

#[test]
fn unlinked_pairs_have_no_route() {
    let mut world = NetWorld::default();
    build_point_to_point_pairs(&mut world, 4, &PointToPointOpts::default()).expect("build p2p");
    let net = &mut world.net;
    assert!(net.route_exists(NodeId(0), NodeId(1)));
    assert!(!net.route_exists(NodeId(1), NodeId(2)));
    assert!(!net.route_exists(NodeId(0), NodeId(0)));
}

#[test]
fn a_node_attaches_to_a_channel_once() {
    let mut world = NetWorld::default();
    let (ids, ch) = build_adhoc(&mut world, 2, &AdhocOpts::default()).expect("build adhoc");
    let err = world.net.attach(ch, ids[0]).expect_err("already attached");
    assert_eq!(
        err,
        EngineError::AlreadyAttached {
            node: ids[0],
            channel: ch.0
        }
    );
    assert_eq!(
        world.net.attach(crate::net::ChannelId(9), ids[0]),
        Err(EngineError::UnknownChannel(9))
    );
}

#[test]
fn ephemeral_ports_count_up_per_node() {
    let mut world = NetWorld::default();
    build_point_to_point_pairs(&mut world, 2, &PointToPointOpts::default()).expect("build p2p");
    let net = &mut world.net;
    assert_eq!(net.alloc_port(NodeId(0)), Ok(49_153));
    assert_eq!(net.alloc_port(NodeId(0)), Ok(49_154));
    assert_eq!(net.alloc_port(NodeId(1)), Ok(49_153));
    assert_eq!(net.alloc_port(NodeId(7)), Err(EngineError::UnknownNode(NodeId(7))));
}
