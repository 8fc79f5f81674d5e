//! Start-up order demo: an app opens "storage" before it exists, a storage
//! service publishes it later, and a fake input interrupt feeds key events
//! through a message queue until the app is told to stop.
//!
//! Run with `RUST_LOG=debug` to see the core's own log lines.

use furry_core::sync::FlagWait;
use furry_core::thread::{self, ThreadId};
use furry_core::{
    furry_printf, isr, kernel, FurryString, Kernel, KernelConfig, MessageQueue, Mutex, MutexType,
    Timeout,
};
use std::sync::Arc;
use std::time::Duration;

const STOP: u32 = 1 << 0;

struct Storage {
    lock: Mutex,
    lines: parking_lot::Mutex<Vec<FurryString>>,
}

impl Storage {
    fn append(&self, line: FurryString) -> furry_core::Result<()> {
        let _guard = self.lock.lock(Timeout::from_millis(100))?;
        self.lines.lock().push(line);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum InputEvent {
    Press(u8),
    Release(u8),
}

fn input_interrupt(queue: &MessageQueue<InputEvent>, key: u8) {
    isr::run(|| {
        let irq = queue.isr();
        for event in [InputEvent::Press(key), InputEvent::Release(key)] {
            if irq.put(event).is_err() {
                // Queue full: drop the rest of this key.
                return;
            }
        }
    });
}

fn app(kernel: Arc<Kernel>, queue: Arc<MessageQueue<InputEvent>>) -> usize {
    let storage: Arc<Storage> = kernel.registry().open("storage");
    let mut handled = 0;
    loop {
        if thread::flags_wait(STOP, FlagWait::ANY, Timeout::NONE).is_ok() {
            break;
        }
        let event = match queue.get(Timeout::from_millis(50)) {
            Ok(event) => event,
            Err(_) => continue,
        };
        let mut line = FurryString::new();
        let formatted = match event {
            InputEvent::Press(key) => furry_printf!(line, "Key: %02X pressed at %lu", key, kernel::tick()),
            InputEvent::Release(key) => furry_printf!(line, "Key: %02X released at %lu", key, kernel::tick()),
        };
        if formatted.is_ok() && storage.append(line).is_ok() {
            handled += 1;
        }
    }
    kernel.registry().close("storage");
    handled
}

fn main() {
    env_logger::init();

    let kernel = Arc::new(Kernel::new(KernelConfig {
        name: "record_demo",
        record_wait_warn_interval: Duration::from_millis(200),
        ..KernelConfig::default()
    }));
    if let Err(err) = kernel.init() {
        eprintln!("kernel init failed: {err}");
        return;
    }

    let queue = Arc::new(MessageQueue::new(8));

    let app_handle = {
        let kernel = kernel.clone();
        let queue = queue.clone();
        match kernel.thread_builder().name("app").spawn(move || app(kernel, queue)) {
            Ok(handle) => handle,
            Err(err) => {
                eprintln!("spawn failed: {err}");
                return;
            }
        }
    };
    let app_id: ThreadId = app_handle.id();

    // The storage service comes up after the app already waits for it.
    kernel::delay_ms(300);
    let storage = Arc::new(Storage {
        lock: Mutex::new(MutexType::Normal),
        lines: parking_lot::Mutex::new(Vec::new()),
    });
    kernel.registry().create("storage", storage.clone());

    for key in [0x0A, 0x0B, 0x1F] {
        input_interrupt(&queue, key);
        kernel::delay_ms(20);
    }
    kernel::delay_ms(100);
    isr::run(|| thread::flags_set(app_id, STOP)).ok();

    let handled = match app_handle.join() {
        Ok(handled) => handled,
        Err(_) => {
            eprintln!("app thread panicked");
            return;
        }
    };

    println!("app handled {handled} input events");
    for line in storage.lines.lock().iter() {
        println!("  {line}");
    }

    drop(storage);
    match Arc::try_unwrap(kernel) {
        Ok(kernel) => {
            if let Err(err) = kernel.teardown() {
                eprintln!("teardown: {err}");
            }
        }
        Err(_) => eprintln!("kernel still shared at exit"),
    }
}
