use colored::{Color, Colorize};

use crate::outcome::{BatchStatistics, RequestContext, ResponseData, SingleResult, TestOutcome};

const PREVIEW_LIMIT: usize = 2048;

pub fn print_outcome(outcome: &TestOutcome) {
    match outcome {
        TestOutcome::Error { message, details } => {
            println!("{} {}", "Error:".bold().red(), message);
            if let Some(details) = details {
                println!("  {}", details.dimmed());
            }
        }
        TestOutcome::Single {
            result,
            context,
            cancelled,
        } => {
            print_context(context);
            if *cancelled {
                print_cancelled();
            }
            print_result(result);
        }
        TestOutcome::Batch {
            first_result,
            statistics,
            context,
            cancelled,
            ..
        } => {
            print_context(context);
            print_statistics(statistics, *cancelled);
            println!("{}", "First request".bold());
            print_result(first_result);
        }
    }
}

fn print_context(context: &RequestContext) {
    println!(
        "{} {}",
        context.method.to_string().bold(),
        context.url.cyan()
    );
    if let Some(body) = &context.request_body {
        println!(
            "{} {}",
            "Request body:".bold(),
            format!("{} bytes", body.to_string().len()).dimmed()
        );
    }
}

fn print_statistics(stats: &BatchStatistics, cancelled: bool) {
    let failed = if stats.failed_requests > 0 {
        stats.failed_requests.to_string().red()
    } else {
        stats.failed_requests.to_string().normal()
    };
    println!(
        "{} {} total, {} ok, {} failed {}",
        "Requests:".bold(),
        stats.total_requests,
        stats.successful_requests.to_string().green(),
        failed,
        format!("({} ms)", stats.total_time_ms).dimmed()
    );
    println!(
        "{} avg {} ms, min {} ms, max {} ms",
        "Latency:".bold(),
        stats.avg_response_time_ms,
        stats.min_response_time_ms,
        stats.max_response_time_ms
    );
    if cancelled {
        print_cancelled();
    }
}

fn print_cancelled() {
    println!("{}", "Batch cancelled before all requests were sent".yellow());
}

fn print_result(result: &SingleResult) {
    println!(
        "{} {} {}",
        "Status:".bold(),
        format!("{} {}", result.status, result.status_text)
            .trim_end()
            .color(status_color(result)),
        format!("({} ms)", result.response_time_ms).dimmed()
    );

    if !result.headers.is_empty() {
        println!("{}", "Response headers".bold());
        for (name, value) in &result.headers {
            println!("  {}: {}", name.cyan(), value.dimmed());
        }
    }

    println!("{}", "Body".bold());
    println!("{}", preview(&result.data));
}

fn status_color(result: &SingleResult) -> Color {
    if result.status == 0 || result.status >= 400 {
        Color::Red
    } else if result.status >= 300 {
        Color::Yellow
    } else {
        Color::Green
    }
}

fn preview(data: &ResponseData) -> String {
    let text = match data {
        ResponseData::Json(value) => {
            serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
        }
        ResponseData::Text(text) => text.clone(),
    };
    truncate(text, PREVIEW_LIMIT)
}

fn truncate(mut text: String, limit: usize) -> String {
    if text.len() <= limit {
        return text;
    }
    let mut cut = limit;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    let hidden = text.len() - cut;
    text.truncate(cut);
    format!("{text}\n... ({hidden} more bytes)")
}
