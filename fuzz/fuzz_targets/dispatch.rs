#![no_main]

use libfuzzer_sys::fuzz_target;
use protocol_bridge::core::Frame;
use protocol_bridge::protocol::{BridgeContext, Dispatcher, Generation, HandlerContext, SessionState};
use protocol_bridge::time::Timezone;

fuzz_target!(|data: &[u8]| {
    // First two bytes select generation and opcode slot; the rest is the body
    if data.len() < 3 {
        return;
    }
    let generation = Generation::ALL[usize::from(data[0]) % Generation::ALL.len()];
    let Ok(bridge) = BridgeContext::new(Generation::Wotlk, Generation::ClassicWotlk, 1, Timezone::UTC) else {
        return;
    };
    let Ok(dispatcher) = Dispatcher::standard() else {
        return;
    };
    let opcodes = dispatcher.opcodes(generation);
    if opcodes.is_empty() {
        return;
    }
    let opcode = opcodes[usize::from(data[1]) % opcodes.len()];

    let mut session = SessionState::new();
    let mut ctx = HandlerContext::new(&bridge, &mut session, generation);
    let _ = dispatcher.dispatch(&Frame::new(opcode, data[2..].to_vec()), &mut ctx);
});
