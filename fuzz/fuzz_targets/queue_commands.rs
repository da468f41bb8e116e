#![no_main]

use libfuzzer_sys::fuzz_target;
use reelqueue::{MediaItem, Playlist, QueueEngine, RepeatMode};

fuzz_target!(|data: &[u8]| {
    let mut engine = QueueEngine::with_seed(0);
    let playlist = Playlist::new(
        "fuzz",
        "fuzz",
        (0..4).map(|n| MediaItem::new(format!("p{n}"), "p")).collect(),
    );
    engine.add_playlist(playlist.clone());

    for pair in data.chunks(2) {
        let arg = pair.get(1).copied().unwrap_or_default() as usize % 40;
        match pair[0] % 14 {
            0 => engine.add_to_queue(MediaItem::new(format!("v{arg}"), "v")),
            1 => engine.add_to_queue_next(MediaItem::new(format!("v{arg}"), "v")),
            2 => {
                let _ = engine.remove_from_queue(arg);
            }
            3 => {
                let _ = engine.move_in_queue(arg % 8, arg / 5);
            }
            4 => {
                let _ = engine.remove_multiple_from_queue(&[arg, arg / 2, arg % 3]);
            }
            5 => engine.clear_queue(),
            6 => {
                let _ = engine.play_next();
            }
            7 => {
                let _ = engine.play_previous();
            }
            8 => {
                let _ = engine.play_at_index(arg);
            }
            9 => engine.toggle_shuffle(),
            10 => engine.set_repeat_mode(match arg % 3 {
                0 => RepeatMode::None,
                1 => RepeatMode::Single,
                _ => RepeatMode::All,
            }),
            11 => engine.record_current(),
            12 => engine.play_playlist(&playlist, arg),
            _ => {
                let _ = engine.remove_playlist("fuzz");
            }
        }

        match engine.cursor() {
            Some(index) => assert!(index < engine.len()),
            None => assert!(engine.is_empty()),
        }
        assert!(engine.history().len() <= reelqueue::history::HISTORY_LIMIT);
    }
});
