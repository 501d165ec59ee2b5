extern crate std;

use soroban_sdk::{
    symbol_short,
    testutils::{Address as _, Events},
    vec, Address, Env, IntoVal, TryIntoVal, Val, Vec,
};

use crate::events::{
    ContributionProcessed, ContributorRefunded, RelayCreated, RelayFunded, SaleClosed,
    SaleStarted, SoftCapReached,
};
use crate::testutils::{set_time, units, Fixture, SOFTCAP_DEADLINE, START_TIME, TOKENS_PER_UNIT};

/// Events published by the sale contract itself, in emission order.
fn sale_events(env: &Env, sale: &Address) -> std::vec::Vec<(Vec<Val>, Val)> {
    env.events()
        .all()
        .iter()
        .filter(|(contract, _, _)| contract == sale)
        .map(|(_, topics, data)| (topics, data))
        .collect()
}

fn find_event(env: &Env, sale: &Address, topics: Vec<Val>) -> Option<Val> {
    sale_events(env, sale)
        .into_iter()
        .find(|(t, _)| *t == topics)
        .map(|(_, data)| data)
}

#[test]
fn test_sale_started_event() {
    let f = Fixture::pending();
    f.client.start(&f.admin);

    let topics = vec![&f.env, symbol_short!("started").into_val(&f.env)];
    let data = find_event(&f.env, &f.client.address, topics).expect("started event missing");
    let event: SaleStarted = data.try_into_val(&f.env).unwrap();
    assert_eq!(
        event,
        SaleStarted {
            admin: f.admin.clone(),
            started_at: START_TIME,
        }
    );
}

#[test]
fn test_relay_created_event() {
    let f = Fixture::pending();
    let contributor = Address::generate(&f.env);
    let relay = f.client.new_contributor_relay(&contributor);

    let all_events = f.env.events().all();
    let last_event = all_events.last().expect("No events found");

    assert_eq!(last_event.0, f.client.address);
    let expected_topics = vec![
        &f.env,
        symbol_short!("relay_new").into_val(&f.env),
        relay.id.into_val(&f.env),
    ];
    assert_eq!(last_event.1, expected_topics);

    let event_data: RelayCreated = last_event.2.try_into_val(&f.env).unwrap();
    assert_eq!(
        event_data,
        RelayCreated {
            relay_id: relay.id,
            contributor: contributor.clone(),
            crowd_sale: f.client.address.clone(),
        }
    );
}

#[test]
fn test_existing_relay_emits_nothing_new() {
    let f = Fixture::pending();
    let contributor = Address::generate(&f.env);
    f.client.new_contributor_relay(&contributor);
    f.client.new_contributor_relay(&contributor);

    let second_id = vec![
        &f.env,
        symbol_short!("relay_new").into_val(&f.env),
        1u32.into_val(&f.env),
    ];
    assert!(find_event(&f.env, &f.client.address, second_id).is_none());
}

#[test]
fn test_relay_funded_event() {
    let f = Fixture::running();
    let dai = f.stable_coin(18);
    let (contributor, relay_id) = f.funded_relay(&dai, units(25));

    let topics = vec![
        &f.env,
        symbol_short!("relay_dep").into_val(&f.env),
        relay_id.into_val(&f.env),
    ];
    let data = find_event(&f.env, &f.client.address, topics).expect("relay_dep event missing");
    let event: RelayFunded = data.try_into_val(&f.env).unwrap();
    assert_eq!(
        event,
        RelayFunded {
            relay_id,
            contributor,
            stable_coin: dai.address.clone(),
            amount: units(25),
            balance: units(25),
        }
    );
}

#[test]
fn test_contribution_and_softcap_events() {
    let f = Fixture::running();
    let dai = f.stable_coin(18);
    let (contributor, relay_id) = f.funded_relay(&dai, units(150));
    f.client
        .process_contribution(&f.admin, &relay_id, &dai.address, &units(150));

    let events = sale_events(&f.env, &f.client.address);
    let contrib_topics = vec![
        &f.env,
        symbol_short!("contrib").into_val(&f.env),
        relay_id.into_val(&f.env),
    ];
    let softcap_topics = vec![&f.env, symbol_short!("softcap").into_val(&f.env)];

    let contrib_pos = events
        .iter()
        .position(|(t, _)| *t == contrib_topics)
        .expect("contrib event missing");
    let softcap_pos = events
        .iter()
        .position(|(t, _)| *t == softcap_topics)
        .expect("softcap event missing");
    assert!(contrib_pos < softcap_pos);

    let contribution: ContributionProcessed =
        events[contrib_pos].1.try_into_val(&f.env).unwrap();
    assert_eq!(
        contribution,
        ContributionProcessed {
            relay_id,
            contributor,
            stable_coin: dai.address.clone(),
            amount: units(150),
            normalized_amount: units(150),
            tokens: 150 * TOKENS_PER_UNIT,
            raised_amount: units(150),
        }
    );

    let softcap: SoftCapReached = events[softcap_pos].1.try_into_val(&f.env).unwrap();
    assert_eq!(
        softcap,
        SoftCapReached {
            raised_amount: units(150)
        }
    );
}

#[test]
fn test_hardcap_contribution_emits_finished() {
    let f = Fixture::running();
    let dai = f.stable_coin(18);
    let (_, relay_id) = f.funded_relay(&dai, units(1_000));
    f.client
        .process_contribution(&f.admin, &relay_id, &dai.address, &units(1_000));

    let topics = vec![&f.env, symbol_short!("finished").into_val(&f.env)];
    let data = find_event(&f.env, &f.client.address, topics).expect("finished event missing");
    let event: SaleClosed = data.try_into_val(&f.env).unwrap();
    assert_eq!(
        event,
        SaleClosed {
            raised_amount: units(1_000),
            tokens_sold: 1_000 * TOKENS_PER_UNIT,
        }
    );
}

#[test]
fn test_failed_and_refund_events() {
    let f = Fixture::running();
    let dai = f.stable_coin(18);
    let (contributor, relay_id) = f.funded_relay(&dai, units(20));

    set_time(&f.env, SOFTCAP_DEADLINE);
    f.client.try_to_switch_state();

    let failed_topics = vec![&f.env, symbol_short!("failed").into_val(&f.env)];
    let data = find_event(&f.env, &f.client.address, failed_topics).expect("failed event missing");
    let event: SaleClosed = data.try_into_val(&f.env).unwrap();
    assert_eq!(
        event,
        SaleClosed {
            raised_amount: 0,
            tokens_sold: 0,
        }
    );

    f.client
        .return_stc_to_contributor(&relay_id, &dai.address, &units(20));

    let refund_topics = vec![
        &f.env,
        symbol_short!("refund").into_val(&f.env),
        relay_id.into_val(&f.env),
    ];
    let data = find_event(&f.env, &f.client.address, refund_topics).expect("refund event missing");
    let event: ContributorRefunded = data.try_into_val(&f.env).unwrap();
    assert_eq!(
        event,
        ContributorRefunded {
            relay_id,
            contributor,
            stable_coin: dai.address.clone(),
            amount: units(20),
        }
    );
}
