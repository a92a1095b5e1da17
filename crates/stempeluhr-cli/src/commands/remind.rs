use stempeluhr_core::commute::reminder;
use stempeluhr_core::{CommuteDayChecker, TrackingRepository};

use super::{parse_time, App};

pub fn run(at: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let app = App::open()?;
    let now = app.now();
    let time = match at {
        Some(value) => parse_time(value)?,
        None => now.time(),
    };

    let day_checker = CommuteDayChecker::new(app.settings.subscribe());
    let no_tracking = reminder::should_show_no_tracking_reminder(
        time,
        reminder::default_reminder_time(),
        day_checker.is_commute_day(now.date().and_time(time)),
        app.db.has_entry_on(now.date())?,
    );
    // the late check wants "still open", not "exists today"
    let late = reminder::should_show_late_tracking_reminder(
        time,
        reminder::default_cutoff_time(),
        !app.machine.state().is_idle(),
    );

    if no_tracking {
        println!("reminder: commute day without any tracking yet");
    }
    if late {
        println!("reminder: a session is still open this late");
    }
    if !no_tracking && !late {
        println!("nothing to remind");
    }
    Ok(())
}
