use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::rc::Rc;
use std::thread;

use crossbeam_channel as cb;
use log::{debug, warn};

/// The console byte stream: keyboard bytes and control codes arrive here,
/// acknowledgements and diagnostics go back out.
pub trait SerialPort {
    /// Next pending byte without consuming it.
    fn peek(&mut self) -> Option<u8>;

    /// Consume the next pending byte.
    fn read(&mut self) -> Option<u8>;

    fn write_str(&mut self, s: &str);

    fn available(&mut self) -> bool {
        self.peek().is_some()
    }

    fn write_line(&mut self, s: &str) {
        self.write_str(s);
        self.write_str("\n");
    }
}

#[derive(Default)]
struct Buffers {
    input: VecDeque<u8>,
    output: String,
}

/// In-memory console. Clones share the same buffers, so a handle kept outside
/// the machine can feed input and collect output.
#[derive(Clone, Default)]
pub struct BufferedSerial {
    inner: Rc<RefCell<Buffers>>,
}

impl BufferedSerial {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_input(&self, bytes: &[u8]) {
        self.inner.borrow_mut().input.extend(bytes.iter().copied());
    }

    pub fn pending_input(&self) -> usize {
        self.inner.borrow().input.len()
    }

    /// Drain everything written so far.
    pub fn take_output(&self) -> String {
        std::mem::take(&mut self.inner.borrow_mut().output)
    }
}

impl SerialPort for BufferedSerial {
    fn peek(&mut self) -> Option<u8> {
        self.inner.borrow().input.front().copied()
    }

    fn read(&mut self) -> Option<u8> {
        self.inner.borrow_mut().input.pop_front()
    }

    fn write_str(&mut self, s: &str) {
        self.inner.borrow_mut().output.push_str(s);
    }
}

/// Host console on stdin/stdout.
///
/// A reader thread forwards stdin bytes over a channel so the emulation loop
/// never blocks. Line feeds are turned into carriage returns, which is what
/// the Apple-1 monitor expects for Enter.
pub struct StdioSerial {
    rx: cb::Receiver<u8>,
    pending: VecDeque<u8>,
    out: io::Stdout,
}

impl StdioSerial {
    pub fn spawn() -> io::Result<Self> {
        let (tx, rx) = cb::unbounded();
        thread::Builder::new()
            .name("stdin-reader".into())
            .spawn(move || stdin_reader(tx))?;
        Ok(Self {
            rx,
            pending: VecDeque::new(),
            out: io::stdout(),
        })
    }

    fn pump(&mut self) {
        while let Ok(b) = self.rx.try_recv() {
            self.pending.push_back(if b == b'\n' { b'\r' } else { b });
        }
    }
}

fn stdin_reader(tx: cb::Sender<u8>) {
    let stdin = io::stdin();
    let mut buf = [0u8; 64];
    loop {
        match stdin.lock().read(&mut buf) {
            Ok(0) => {
                debug!("stdin closed");
                return;
            }
            Ok(n) => {
                for &b in &buf[..n] {
                    if tx.send(b).is_err() {
                        return;
                    }
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => {
                warn!("Console: stdin read error: {e}");
                return;
            }
        }
    }
}

impl SerialPort for StdioSerial {
    fn peek(&mut self) -> Option<u8> {
        self.pump();
        self.pending.front().copied()
    }

    fn read(&mut self) -> Option<u8> {
        self.pump();
        self.pending.pop_front()
    }

    fn write_str(&mut self, s: &str) {
        let mut out = self.out.lock();
        if let Err(e) = out.write_all(s.as_bytes()).and_then(|_| out.flush()) {
            warn!("Console: stdout write error: {e}");
        }
    }
}
