// Colored terminal output for recommendation lists.
//
// All terminal-specific formatting lives here: colors, headers, synopsis
// previews. main.rs decides what to show and delegates the how.

use colored::Colorize;

use crate::normalize::{Candidate, Origin};
use crate::recommend::genre::GenrePage;
use crate::recommend::RecommendError;
use crate::similarity::ScoredTitle;

use super::{truncate_chars, SYNOPSIS_PREVIEW_CHARS};

/// Display ranked "similar to" recommendations.
pub fn display_similar(favorite_title: &str, recommendations: &[Candidate]) {
    println!(
        "\n{}",
        format!("=== Recommendations similar to '{favorite_title}' ===").bold()
    );
    println!();

    for (i, candidate) in recommendations.iter().enumerate() {
        display_candidate(i + 1, candidate, true);
    }
}

/// Display one page of genre recommendations, with paging hints.
pub fn display_genre_page(page: &GenrePage) {
    println!(
        "\n{}",
        format!(
            "=== Top {} {} anime (page {}/{}) ===",
            page.items.len(),
            page.genre,
            page.page.current_page,
            page.page.last_page
        )
        .bold()
    );
    println!();

    for (i, candidate) in page.items.iter().enumerate() {
        display_candidate(i + 1, candidate, false);
    }

    if let Some(next) = page.page.next() {
        println!(
            "{}",
            format!("More results: run again with --page {next}").dimmed()
        );
    }
    if let Some(previous) = page.page.previous() {
        println!(
            "{}",
            format!("Previous results: --page {previous}").dimmed()
        );
    }
}

/// Display offline (synopsis similarity) neighbours.
pub fn display_offline(title: &str, similar: &[ScoredTitle]) {
    println!(
        "\n{}",
        format!("=== Titles with synopses like '{title}' (offline) ===").bold()
    );
    println!();

    for (i, item) in similar.iter().enumerate() {
        println!(
            "  {:>2}. {:<48} {}",
            i + 1,
            item.title.bold(),
            format!("similarity {:.3}", item.score).dimmed()
        );
    }
}

/// Display a list of genre names, featured ones first.
pub fn display_genres(featured: &[&str], all: &[String]) {
    if all.is_empty() {
        println!(
            "{} Failed to load anime genres. Genre recommendations are unavailable.",
            "Warning:".yellow()
        );
        return;
    }

    if !featured.is_empty() {
        println!("\n{}", "Featured genres:".bold());
        println!("  {}", featured.join(", "));
    }
    println!("\n{}", format!("All genres ({}):", all.len()).bold());
    println!("  {}", all.join(", ").dimmed());
}

/// Explain why a request came back empty.
pub fn display_recommend_error(error: &RecommendError) {
    let label = match error {
        RecommendError::Empty(_) => "Note:".cyan(),
        _ => "Error:".yellow(),
    };
    println!("{} {}", label, error);
}

fn display_candidate(rank: usize, candidate: &Candidate, show_origin: bool) {
    let score = candidate
        .external_score
        .map(|s| format!("{s:.2}"))
        .unwrap_or_else(|| "N/A".to_string());

    let mut header = format!(
        "  {:>2}. {} (Score: {})",
        rank,
        candidate.title.bold(),
        colorize_score(candidate.external_score, &score)
    );
    if show_origin {
        header.push_str(&format!(
            "  {} {}",
            colorize_origin(candidate.origin),
            format!("match {}", candidate.local_score).dimmed()
        ));
    }
    println!("{header}");

    let genres = if candidate.genres.is_empty() {
        "N/A".to_string()
    } else {
        candidate.genres.join(", ")
    };
    println!("      Genres: {genres}");
    if !candidate.themes.is_empty() {
        println!("      Themes: {}", candidate.themes.join(", "));
    }
    if !candidate.studios.is_empty() {
        println!("      Studios: {}", candidate.studios.join(", "));
    }
    match &candidate.image_url {
        Some(url) => println!("      Image: {}", url.dimmed()),
        None => println!("      {}", "No image available".dimmed()),
    }
    println!(
        "      {}",
        truncate_chars(&candidate.synopsis, SYNOPSIS_PREVIEW_CHARS).dimmed()
    );
    println!("      {}", candidate.mal_url().underline());
    println!();
}

fn colorize_origin(origin: Origin) -> colored::ColoredString {
    match origin {
        Origin::Direct => "[direct]".green(),
        Origin::Search => "[search]".blue(),
    }
}

fn colorize_score(score: Option<f64>, text: &str) -> colored::ColoredString {
    match score {
        Some(s) if s >= 8.5 => text.bright_green().bold(),
        Some(s) if s >= 7.5 => text.green(),
        Some(_) => text.yellow(),
        None => text.dimmed(),
    }
}
