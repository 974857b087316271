//! Property tests for the register codec and sample filters

#![cfg(test)]

use growsense_core::{
    codec::{decode_config, decode_signed, decode_unsigned, encode_config, encode_signed, Channel, DataRate, Gain, Mode},
    sampling::Filter,
};
use proptest::prelude::*;
use proptest::sample::select;

fn channels() -> impl Strategy<Value = Channel> {
    select(vec![
        Channel::Diff01, Channel::Diff03, Channel::Diff13, Channel::Diff23,
        Channel::A0, Channel::A1, Channel::A2, Channel::A3,
    ])
}

fn gains() -> impl Strategy<Value = Gain> {
    select(vec![Gain::TwoThirds, Gain::One, Gain::Two, Gain::Four, Gain::Eight, Gain::Sixteen])
}

fn rates() -> impl Strategy<Value = DataRate> {
    select(vec![
        DataRate::Sps8, DataRate::Sps16, DataRate::Sps32, DataRate::Sps64,
        DataRate::Sps128, DataRate::Sps250, DataRate::Sps475, DataRate::Sps860,
    ])
}

fn modes() -> impl Strategy<Value = Mode> {
    select(vec![Mode::SingleShot, Mode::Continuous])
}

proptest! {
    #[test]
    fn config_word_decodes_to_its_fields(channel in channels(), gain in gains(), rate in rates(), mode in modes()) {
        let word = encode_config(channel, gain, mode, rate);
        let decoded = decode_config(word);

        prop_assert_eq!(decoded.channel, channel);
        prop_assert_eq!(decoded.gain, gain);
        prop_assert_eq!(decoded.data_rate, rate);
        prop_assert_eq!(decoded.mode, mode);
        prop_assert_eq!(word & 0x8003, 0x8003);
    }

    #[test]
    fn signed_decode_is_twos_complement(low in any::<u8>(), high in any::<u8>()) {
        let unsigned = decode_unsigned(low, high) as i32;
        let expected = if unsigned >= 32768 { unsigned - 65536 } else { unsigned };
        prop_assert_eq!(decode_signed(low, high) as i32, expected);
    }

    #[test]
    fn signed_round_trip(value in any::<i16>()) {
        let (low, high) = encode_signed(value);
        prop_assert_eq!(decode_signed(low, high), value);
    }

    #[test]
    fn median_is_bounded_and_order_preserving(samples in prop::collection::vec(-32768.0f32..32767.0, 1..64)) {
        let before = samples.clone();
        let median = Filter::Median.apply(&samples).unwrap();

        prop_assert_eq!(&samples, &before);
        let min = samples.iter().copied().fold(f32::INFINITY, f32::min);
        let max = samples.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        prop_assert!(median >= min && median <= max);

        let below = samples.iter().filter(|s| **s < median).count();
        let above = samples.iter().filter(|s| **s > median).count();
        prop_assert!(below <= samples.len() / 2);
        prop_assert!(above <= samples.len() / 2);
    }

    #[test]
    fn mean_is_bounded(samples in prop::collection::vec(-32768.0f32..32767.0, 1..64)) {
        let mean = Filter::Mean.apply(&samples).unwrap();
        let min = samples.iter().copied().fold(f32::INFINITY, f32::min);
        let max = samples.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        // f32 summation error over 63 samples stays well under one count
        prop_assert!(mean >= min - 1.0 && mean <= max + 1.0);
    }
}
