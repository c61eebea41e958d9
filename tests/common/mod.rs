#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use silk_decode_rs::audio::{CodecEngine, DecodeControl, EngineError, Subframe};

pub const STATE_SIZE: usize = 256;

/// Observations shared between a test and the engine it handed to a session.
#[derive(Default)]
pub struct Counters {
    pub size_queries: Cell<usize>,
    pub inits: Cell<usize>,
    pub decode_calls: Cell<usize>,
    pub state_addrs: RefCell<Vec<usize>>,
    pub seen_rates: RefCell<Vec<i32>>,
}

/// Engine double that counts state allocations and keeps its position in
/// the current packet's sub-frame chain inside the opaque state.
pub struct CountingEngine {
    pub counters: Rc<Counters>,
    /// Sub-frames every packet chains.
    pub chain_len: usize,
    /// Samples produced per sub-frame.
    pub samples: usize,
    /// Status to fail with on this (1-based) decode call.
    pub fail_on_call: Option<(usize, i32)>,
}

impl CountingEngine {
    pub fn new(counters: Rc<Counters>) -> Self {
        Self {
            counters,
            chain_len: 1,
            samples: 480,
            fail_on_call: None,
        }
    }

    pub fn chained(counters: Rc<Counters>, chain_len: usize, samples: usize) -> Self {
        Self {
            chain_len,
            samples,
            ..Self::new(counters)
        }
    }
}

impl CodecEngine for CountingEngine {
    fn state_size(&self) -> usize {
        self.counters.size_queries.set(self.counters.size_queries.get() + 1);
        STATE_SIZE
    }

    fn init_state(&self, state: &mut [u8]) -> Result<(), EngineError> {
        self.counters.inits.set(self.counters.inits.get() + 1);
        assert!(state.iter().all(|&b| b == 0), "state handed over dirty");
        state[STATE_SIZE - 1] = 0xC5;
        Ok(())
    }

    fn decode_subframe(
        &self,
        state: &mut [u8],
        control: &mut DecodeControl,
        _lost: bool,
        input: &[u8],
        output: &mut [i16],
    ) -> Result<Subframe, EngineError> {
        let call = self.counters.decode_calls.get() + 1;
        self.counters.decode_calls.set(call);
        self.counters.state_addrs.borrow_mut().push(state.as_ptr() as usize);
        self.counters.seen_rates.borrow_mut().push(control.sample_rate);
        assert_eq!(state[STATE_SIZE - 1], 0xC5, "state not initialized");

        if let Some((n, status)) = self.fail_on_call {
            if n == call {
                control.more_internal_frames = false;
                state[0] = 0;
                return Err(EngineError::Status(status));
            }
        }

        let index = state[0] as usize;
        let fill = i16::from(input.first().copied().unwrap_or(0)) + index as i16;
        output[..self.samples].fill(fill);

        if index + 1 < self.chain_len {
            state[0] += 1;
            control.more_internal_frames = true;
        } else {
            state[0] = 0;
            control.more_internal_frames = false;
        }
        Ok(Subframe::decoded(self.samples))
    }
}

/// Prefix `body` with its little-endian `i16` length.
pub fn silk_packet(body: &[u8]) -> Vec<u8> {
    let mut packet = (body.len() as i16).to_le_bytes().to_vec();
    packet.extend_from_slice(body);
    packet
}
