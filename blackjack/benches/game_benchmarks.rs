use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use blackjack::{
    Deck,
    entities::{Card, Suit, hand_value},
    messages::{Decision, Offer, Request, RoundPayload, WireMessage},
};
use std::hint::black_box;

/// Benchmark scoring hands of increasing size, all containing an ace
fn bench_hand_value(c: &mut Criterion) {
    let mut group = c.benchmark_group("hand_value");
    for n_cards in [2usize, 4, 8] {
        let cards: Vec<Card> = (0..n_cards)
            .map(|i| Card((i % 13) as u8 + 1, Suit::ALL[i % 4]))
            .collect();
        group.bench_with_input(BenchmarkId::from_parameter(n_cards), &cards, |b, cards| {
            b.iter(|| hand_value(black_box(cards)));
        });
    }
    group.finish();
}

/// Benchmark shuffling a fresh deck and dealing it out
fn bench_deck(c: &mut Criterion) {
    c.bench_function("deck_shuffle", |b| {
        b.iter(Deck::shuffled);
    });

    c.bench_function("deck_deal_all", |b| {
        b.iter(|| {
            let mut deck = Deck::shuffled();
            while let Ok(card) = deck.draw() {
                black_box(card);
            }
        });
    });
}

/// Benchmark encoding and decoding each message kind
fn bench_codec(c: &mut Criterion) {
    let offer = Offer {
        tcp_port: 4242,
        server_name: "NoSocketsJustCards".to_string(),
    };
    let request = Request {
        num_rounds: 10,
        client_name: "bench".to_string(),
    };
    let payload = RoundPayload::card(Card(12, Suit::Spade));

    let mut group = c.benchmark_group("codec");
    group.bench_function("encode_offer", |b| b.iter(|| black_box(&offer).encode()));
    group.bench_function("encode_request", |b| b.iter(|| black_box(&request).encode()));
    group.bench_function("encode_payload", |b| b.iter(|| black_box(&payload).encode()));

    let offer_bytes = offer.encode().unwrap();
    let request_bytes = request.encode().unwrap();
    let payload_bytes = payload.encode().unwrap();
    let decision_bytes = Decision::Stand.encode().unwrap();
    group.bench_function("decode_offer", |b| {
        b.iter(|| Offer::decode(black_box(&offer_bytes)));
    });
    group.bench_function("decode_request", |b| {
        b.iter(|| Request::decode(black_box(&request_bytes)));
    });
    group.bench_function("decode_payload", |b| {
        b.iter(|| RoundPayload::decode(black_box(&payload_bytes)));
    });
    group.bench_function("decode_decision", |b| {
        b.iter(|| Decision::decode(black_box(&decision_bytes)));
    });
    group.finish();
}

criterion_group!(benches, bench_hand_value, bench_deck, bench_codec);
criterion_main!(benches);
