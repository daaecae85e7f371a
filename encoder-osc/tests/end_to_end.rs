//! Both loops running on their own threads against simulated expanders.

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use embedded_hal::delay::DelayNs;
use encoder_osc::device::open_all;
use encoder_osc::osc::decode_batch;
use encoder_osc::{
    run_loops, BusAddress, CancellationToken, Config, Context, Device, OpenError, Transport,
};
use mcp23017_driver::sim::SimulatedExpander;
use mcp23017_driver::Port;
use quadrature::QuadratureDecoder;

/// Sleeps for real.
struct SleepDelay;

impl DelayNs for SleepDelay {
    fn delay_ns(&mut self, ns: u32) {
        thread::sleep(Duration::from_nanos(u64::from(ns)));
    }
}

/// Shares every datagram with the test thread.
#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<Vec<Vec<u8>>>>);

impl Recorder {
    /// Every `(channel, position)` sent so far, in order.
    fn messages(&self) -> Vec<(i32, i32)> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .flat_map(|d| decode_batch(d).unwrap())
            .map(|(addr, m)| {
                assert_eq!(addr, "/encoder");
                (m.channel, m.position)
            })
            .collect()
    }

    fn last_position(&self, channel: i32) -> Option<i32> {
        self.messages()
            .into_iter()
            .filter(|&(c, _)| c == channel)
            .map(|(_, p)| p)
            .last()
    }
}

impl Transport for Recorder {
    fn send(&mut self, datagram: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().push(datagram.to_vec());
        Ok(datagram.len())
    }
}

/// Drive one pin and wait until the poll loop has read the capture.
///
/// Two further port B capture reads mean at least one full pass started
/// after the edge was latched.
fn step(sim: &SimulatedExpander, pin: u8, high: bool) {
    let before = sim.intcap_reads(Port::B);
    sim.set_pin(pin, high);
    let deadline = Instant::now() + Duration::from_secs(5);
    while sim.intcap_reads(Port::B) < before + 2 {
        assert!(Instant::now() < deadline, "poll loop stalled");
        thread::yield_now();
    }
}

fn clockwise(sim: &SimulatedExpander, a: u8, b: u8) {
    step(sim, a, true);
    step(sim, b, true);
    step(sim, a, false);
    step(sim, b, false);
}

fn counter_clockwise(sim: &SimulatedExpander, a: u8, b: u8) {
    step(sim, b, true);
    step(sim, a, true);
    step(sim, b, false);
    step(sim, a, false);
}

fn wait_for(recorder: &Recorder, channel: i32, position: i32) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while recorder.last_position(channel) != Some(position) {
        assert!(
            Instant::now() < deadline,
            "channel {channel} never reached {position}: {:?}",
            recorder.messages()
        );
        thread::sleep(Duration::from_millis(5));
    }
}

fn context(
    sims: &[SimulatedExpander],
    config: &Config,
) -> Context<SimulatedExpander, QuadratureDecoder> {
    let devices = sims
        .iter()
        .map(|sim| Device::open(BusAddress::new(1, sim.address()), sim.clone()).unwrap())
        .collect();
    let mut context =
        Context::new(devices, config.pairs_per_device(), QuadratureDecoder::default).unwrap();
    context.configure_pins();
    context
}

#[test]
fn rotations_arrive_as_osc_messages() {
    let config = Config::default();
    let sims: Vec<_> = [0x21, 0x22, 0x26, 0x27]
        .into_iter()
        .map(SimulatedExpander::new)
        .collect();
    let mut context = context(&sims, &config);
    let recorder = Recorder::default();
    let token = CancellationToken::new();

    thread::scope(|scope| {
        let script = {
            let sims = sims.clone();
            let recorder = recorder.clone();
            let token = token.clone();
            scope.spawn(move || {
                // Board 0, pair (0, 1): three forward, one back.
                for _ in 0..3 {
                    clockwise(&sims[0], 0, 1);
                }
                counter_clockwise(&sims[0], 0, 1);
                wait_for(&recorder, 0, 2);

                // Board 3, pair (12, 13) is the last channel.
                counter_clockwise(&sims[3], 12, 13);
                wait_for(&recorder, 15, -1);

                token.cancel();
            })
        };

        run_loops(
            &mut context,
            &config,
            recorder.clone(),
            &token,
            SleepDelay,
            SleepDelay,
        );
        script.join().unwrap();
    });

    let messages = recorder.messages();
    assert!(messages.iter().all(|&(channel, _)| channel == 0 || channel == 15));
    assert_eq!(recorder.last_position(0), Some(2));
    assert_eq!(recorder.last_position(15), Some(-1));
}

#[test]
fn failed_board_contributes_no_channels() {
    let config = Config {
        devices: vec![BusAddress::new(1, 0x21), BusAddress::new(1, 0x22)],
        ..Config::default()
    };
    // Only 0x22 answers; it takes slot 0.
    let sim = SimulatedExpander::new(0x22);
    let devices = open_all(&config.devices, |address| {
        if address.address != sim.address() {
            return Err(OpenError::Init(format!("{address} silent")));
        }
        Device::open(address, sim.clone())
    });
    let mut context =
        Context::new(devices, config.pairs_per_device(), QuadratureDecoder::default).unwrap();
    context.configure_pins();
    assert_eq!(context.layout.channel_count(), 4);

    let recorder = Recorder::default();
    let token = CancellationToken::new();

    thread::scope(|scope| {
        let script = {
            let sim = sim.clone();
            let recorder = recorder.clone();
            let token = token.clone();
            scope.spawn(move || {
                // Pair (9, 8) is channel 2 of the only slot.
                clockwise(&sim, 9, 8);
                clockwise(&sim, 12, 13);
                wait_for(&recorder, 2, 1);
                wait_for(&recorder, 3, 1);
                token.cancel();
            })
        };

        run_loops(
            &mut context,
            &config,
            recorder.clone(),
            &token,
            SleepDelay,
            SleepDelay,
        );
        script.join().unwrap();
    });

    assert!(recorder.messages().iter().all(|&(channel, _)| channel < 4));
    assert_eq!(recorder.last_position(2), Some(1));
    assert_eq!(recorder.last_position(3), Some(1));
}

#[test]
fn untouched_boards_send_nothing() {
    let config = Config::default();
    let sims = vec![SimulatedExpander::new(0x21)];
    let mut context = context(&sims, &config);
    let recorder = Recorder::default();
    let token = CancellationToken::new();

    thread::scope(|scope| {
        let canceller = token.clone();
        scope.spawn(move || {
            thread::sleep(Duration::from_millis(100));
            canceller.cancel();
        });
        run_loops(
            &mut context,
            &config,
            recorder.clone(),
            &token,
            SleepDelay,
            SleepDelay,
        );
    });

    assert!(recorder.0.lock().unwrap().is_empty());
}
