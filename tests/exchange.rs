use std::sync::Arc;
use std::thread;
use std::time::Duration;

use eeprobe::{Mailbox, MailboxError, Mode, Operation, Prober, ProbeConfig, ANY_SOURCE};

const MESSAGES: u32 = 6;

fn spawn_sender(mailbox: Arc<Mailbox>, gap: Duration) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        for i in 0..MESSAGES {
            thread::sleep(gap);
            mailbox.post(0, 1, i.to_le_bytes().to_vec()).unwrap();
        }
    })
}

fn config() -> ProbeConfig {
    ProbeConfig::builder()
        .min_delay(Duration::from_micros(10))
        .max_delay(Duration::from_micros(500))
        .increment(Duration::from_micros(50))
        .build()
        .unwrap()
}

#[test]
fn adaptive_probe_delivers_every_message_in_order() {
    let mailbox = Arc::new(Mailbox::new());
    let sender = spawn_sender(Arc::clone(&mailbox), Duration::from_millis(5));

    let cfg = config();
    let mut prober = Prober::new(cfg);
    for i in 0..MESSAGES {
        prober.probe(&*mailbox, 0, 1, Mode::Adaptive).unwrap();
        let message = mailbox.recv(0, 1).unwrap();
        assert_eq!(message.payload, i.to_le_bytes().to_vec());
        assert!(prober.last_delay() >= cfg.min_delay());
        assert!(prober.last_delay() <= cfg.max_delay());
    }
    sender.join().unwrap();

    assert!(prober.total_sleep_time() > Duration::ZERO);
    assert_eq!(
        prober.total_sleep_time(),
        prober.total_sleep_time_for(Operation::Probe)
    );
}

#[test]
fn pass_through_never_accounts_sleep() {
    let mailbox = Arc::new(Mailbox::new());
    let sender = spawn_sender(Arc::clone(&mailbox), Duration::from_millis(2));

    let mut prober = Prober::new(config());
    for _ in 0..MESSAGES {
        prober.probe(&*mailbox, ANY_SOURCE, 1, Mode::PassThrough).unwrap();
        mailbox.recv(ANY_SOURCE, 1).unwrap();
    }
    sender.join().unwrap();

    assert_eq!(prober.total_sleep_time(), Duration::ZERO);
    assert_eq!(prober.last_delay(), config().min_delay());
}

#[test]
fn nonblocking_receive_completes_under_backoff() {
    let mailbox = Arc::new(Mailbox::new());
    let sender = spawn_sender(Arc::clone(&mailbox), Duration::from_millis(3));

    let mut prober = Prober::new(config());
    for i in 0..MESSAGES {
        let mut request = mailbox.irecv(0, 1);
        prober
            .complete(&mut request, Operation::Recv, Mode::Adaptive)
            .unwrap();
        let message = request.into_message().unwrap();
        assert_eq!(message.payload, i.to_le_bytes().to_vec());
    }
    sender.join().unwrap();

    assert_eq!(prober.total_sleep_time_for(Operation::Probe), Duration::ZERO);
    assert_eq!(
        prober.total_sleep_time(),
        prober.total_sleep_time_for(Operation::Recv)
    );
}

#[test]
fn closing_the_channel_surfaces_its_error() {
    let mailbox = Arc::new(Mailbox::new());
    let closer = {
        let mailbox = Arc::clone(&mailbox);
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(5));
            mailbox.close();
        })
    };

    let mut prober = Prober::new(config());
    let result = prober.probe(&*mailbox, 0, 1, Mode::Adaptive);
    closer.join().unwrap();

    assert_eq!(result, Err(MailboxError::Closed));
}
