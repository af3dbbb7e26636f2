use codetime_core::{format_duration, AggregateStats, DailyRecord};
use tabled::settings::object::Rows;
use tabled::settings::{Color, Modify, Style};
use tabled::{Table, Tabled};

const TOP_ENTRIES: usize = 10;

#[derive(Tabled)]
struct DayRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Day")]
    day: String,
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Top language")]
    language: String,
}

#[derive(Tabled)]
struct ShareRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Share")]
    share: String,
}

pub fn show_stats(stats: &AggregateStats, days: usize) {
    println!(
        "\x1b[1;36mLast {} day(s)\x1b[0m  total {}, average {}/day",
        days.max(1),
        format_duration(stats.total_seconds),
        format_duration(stats.average_per_day as u64),
    );

    if let Some(date) = stats.most_productive_day.date {
        println!(
            "Most productive day:  {} ({})",
            date.format("%Y-%m-%d (%a)"),
            format_duration(stats.most_productive_day.seconds)
        );
    }
    if let Some(hour) = stats.most_productive_hour.hour {
        println!(
            "Most productive hour: {:02}:00-{:02}:00 ({})",
            hour,
            (hour + 1) % 24,
            format_duration(stats.most_productive_hour.seconds)
        );
    }

    let rows: Vec<DayRow> = stats.daily_data.iter().map(day_row).collect();
    print_table(rows);

    if stats.total_seconds == 0 {
        println!("No coding time recorded yet.");
        return;
    }

    println!("\n\x1b[1;36mLanguages\x1b[0m");
    print_table(share_rows(&stats.top_languages(), stats.total_seconds));

    println!("\n\x1b[1;36mFiles\x1b[0m");
    print_table(share_rows(&stats.top_files(), stats.total_seconds));
}

fn day_row(day: &DailyRecord) -> DayRow {
    let language = day
        .language_seconds
        .iter()
        .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
        .map(|(lang, _)| lang.clone())
        .unwrap_or_else(|| "-".to_string());

    DayRow {
        date: day.date.format("%Y-%m-%d").to_string(),
        day: day.date.format("%a").to_string(),
        time: format_duration(day.total_seconds),
        language,
    }
}

fn share_rows(entries: &[(&str, u64)], total: u64) -> Vec<ShareRow> {
    entries
        .iter()
        .take(TOP_ENTRIES)
        .map(|(name, seconds)| ShareRow {
            name: name.to_string(),
            time: format_duration(*seconds),
            share: format!("{:.1}%", *seconds as f64 * 100.0 / total.max(1) as f64),
        })
        .collect()
}

fn print_table<T: Tabled>(rows: Vec<T>) {
    let mut table = Table::new(rows);
    table
        .with(Style::modern())
        .with(Modify::new(Rows::first()).with(Color::FG_CYAN));
    println!("{}", table);
}
