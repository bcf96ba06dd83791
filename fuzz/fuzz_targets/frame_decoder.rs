#![no_main]

use bytes::BytesMut;
use libfuzzer_sys::fuzz_target;
use protocol_bridge::crypto::{keyed_cipher, CipherKind, SessionKey};
use protocol_bridge::protocol::{BridgeContext, Connection, Dispatcher, Generation};
use protocol_bridge::time::Timezone;
use std::sync::Arc;

fuzz_target!(|data: &[u8]| {
    // Arbitrary server bytes must end in frames, drops or a fatal error, never a panic
    let Ok(bridge) = BridgeContext::new(Generation::Wotlk, Generation::ClassicWotlk, 1, Timezone::UTC) else {
        return;
    };
    let Ok(key) = SessionKey::new(vec![0x11u8; 40]) else {
        return;
    };
    let Ok(cipher) = keyed_cipher(CipherKind::HmacFeedback, &key) else {
        return;
    };
    let Ok(dispatcher) = Dispatcher::standard() else {
        return;
    };
    let Ok(mut conn) = Connection::new(Arc::new(bridge.with_max_frame_body(1 << 12)), Arc::new(dispatcher), cipher) else {
        return;
    };

    let mut out = BytesMut::new();
    for chunk in data.chunks(7) {
        if conn.from_server(chunk, &mut out).is_err() {
            break;
        }
    }
});
