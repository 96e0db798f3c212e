//! Replay a synthetic 60 fps frame stream and print the gesture report

use synheart_gesture::{FaceResult, GestureConfig, GestureProcessor, StreamRecord};

const FRAME_MS: f64 = 1000.0 / 60.0;

fn face_at(t: f64) -> FaceResult {
    // Two blinks, one mouth opening and a brow raise after calibration settles.
    let blink = if (1200.0..1300.0).contains(&t) || (2000.0..2080.0).contains(&t) {
        0.85
    } else {
        0.05
    };
    let mouth = if (2500.0..3000.0).contains(&t) { 0.7 } else { 0.1 };
    let brow = if (3400.0..3800.0).contains(&t) { 0.65 } else { 0.2 };

    FaceResult::from_scores([
        ("eyeBlinkLeft", blink),
        ("eyeBlinkRight", blink),
        ("jawOpen", mouth),
        ("browInnerUp", brow),
    ])
}

fn main() {
    let mut records = vec![StreamRecord::Start { timestamp_ms: 0.0 }];
    let mut t = 0.0;
    while t < 4500.0 {
        // Face lost briefly mid-stream.
        let face = if (1600.0..1700.0).contains(&t) {
            None
        } else {
            Some(face_at(t))
        };
        records.push(StreamRecord::frame(t, face));
        t += FRAME_MS;
    }
    records.push(StreamRecord::Stop { timestamp_ms: t });

    let mut processor = match GestureProcessor::new(GestureConfig::default()) {
        Ok(processor) => processor,
        Err(e) => {
            eprintln!("Error: {e}");
            return;
        }
    };

    for record in &records {
        match processor.process_record(record) {
            Ok(Some(snapshot)) if !snapshot.events.is_empty() => {
                let names: Vec<&str> = snapshot.events.iter().map(|g| g.as_str()).collect();
                println!("{:>8.1}ms  {}", snapshot.timestamp_ms, names.join(", "));
            }
            Ok(_) => {}
            Err(e) => {
                eprintln!("Error: {e}");
                return;
            }
        }
    }

    match serde_json::to_string_pretty(&processor.report()) {
        Ok(report) => println!("{report}"),
        Err(e) => eprintln!("Error: {e:?}"),
    }
}
