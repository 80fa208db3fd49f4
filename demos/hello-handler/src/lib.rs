//! Minimal handler module for the dispatch gateway.
//!
//! Exports the callable surface the gateway expects (`memory`, `alloc`,
//! `handle`), logs one line through the host capability, and answers every
//! request with a fixed text response.
//!
//! Build with: `cargo build --target wasm32-unknown-unknown --release`

#![no_std]

use core::panic::PanicInfo;

#[panic_handler]
fn panic(_info: &PanicInfo) -> ! {
    loop {}
}

#[link(wasm_import_module = "env")]
extern "C" {
    fn log(level: i32, ptr: *const u8, len: i32);
}

static RESPONSE: &str =
    r#"{"response":{"status":200,"headers":[["content-type","text/plain"]],"body":"hello from the edge"}}"#;

// Bump arena for the inbound request payload
static mut ARENA: [u8; 65536] = [0u8; 65536];
static mut OFFSET: usize = 0;

#[no_mangle]
pub extern "C" fn alloc(len: i32) -> i32 {
    unsafe {
        let start = OFFSET;
        OFFSET += len as usize;
        if OFFSET > ARENA.len() {
            // Out of arena; the host will observe the write failure
            return -1;
        }
        ARENA.as_ptr().add(start) as i32
    }
}

#[no_mangle]
pub extern "C" fn handle(_ptr: i32, _len: i32) -> i64 {
    let message = "handling one request";
    unsafe {
        log(1, message.as_ptr(), message.len() as i32); // Info level = 1
    }

    let ptr = RESPONSE.as_ptr() as i64;
    let len = RESPONSE.len() as i64;
    (ptr << 32) | len
}
