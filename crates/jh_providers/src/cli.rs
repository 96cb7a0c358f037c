use clap::{Args, Subcommand};
use jh_core::{Article, NewsQuery, Place, PlaceQuery, Result};

use crate::flows::Services;

#[derive(Args, Debug)]
pub struct ProviderArgs {
    #[command(subcommand)]
    pub command: ProviderCommands,
}

#[derive(Subcommand, Debug)]
pub enum ProviderCommands {
    /// Fetch headlines, GNews first and Google News RSS as fallback
    News {
        /// Free-text search; leave empty for top headlines
        #[arg(default_value = "")]
        query: String,
        /// Topic such as business or technology (unknown topics are ignored)
        #[arg(long)]
        category: Option<String>,
        /// Two-letter country code
        #[arg(long)]
        country: Option<String>,
        #[arg(long, default_value = "en")]
        language: String,
    },
    /// Search the local services directory
    Places {
        query: String,
        /// Where to search, e.g. "Houston, TX"
        #[arg(long, default_value = "")]
        location: String,
    },
    /// Check that a city belongs to a country
    ValidateLocation { city: String, country: String },
    /// Suggest city names as the user types
    Suggest {
        input: String,
        #[arg(long)]
        country: String,
    },
    /// List every city of a country (English country name)
    Cities { country: String },
}

pub async fn handle_command(args: ProviderArgs, services: &Services) -> Result<()> {
    match args.command {
        ProviderCommands::News {
            query,
            category,
            country,
            language,
        } => {
            let query = NewsQuery {
                query,
                category,
                country,
                language,
            };
            let result = services.fetch_news(&query).await;
            if let Some(error) = &result.error {
                eprintln!("⚠️  {}", error);
            }
            println!("Found {} articles", result.articles.len());
            for article in &result.articles {
                println!("{}", format_article(article));
            }
        }
        ProviderCommands::Places { query, location } => {
            let result = services
                .search_local_directory(&PlaceQuery::new(query, location))
                .await;
            if let Some(error) = &result.error {
                eprintln!("⚠️  {}", error);
            }
            println!("Found {} places", result.places.len());
            for place in &result.places {
                println!("{}", format_place(place));
            }
        }
        ProviderCommands::ValidateLocation { city, country } => {
            let check = services.validate_location(&city, &country).await;
            let mark = if check.is_valid { "✅" } else { "❌" };
            println!("{} {} / {}", mark, city, country.to_uppercase());
        }
        ProviderCommands::Suggest { input, country } => {
            for suggestion in services.city_suggestions(&input, &country).await {
                println!("{}  ({})", suggestion.description, suggestion.place_id);
            }
        }
        ProviderCommands::Cities { country } => {
            let cities = services.fetch_cities(&country).await?;
            println!("Found {} cities in {}", cities.len(), country);
            for city in cities {
                println!("  {}", city);
            }
        }
    }
    Ok(())
}

fn format_article(article: &Article) -> String {
    format!(
        "📰 {} - {} ({})",
        article.title, article.source.name, article.url
    )
}

fn format_place(place: &Place) -> String {
    let mut line = format!("📍 {} [{}]", place.name, place.category);
    if place.rating > 0.0 {
        line.push_str(&format!(" ★ {:.1} ({})", place.rating, place.review_count));
    }
    if let Some(address) = &place.address {
        line.push_str(&format!(" - {}", address));
    }
    line
}
