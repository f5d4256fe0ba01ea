//! Non-interactive subcommands

use anyhow::Result;
use colored::*;
use support_core::state::category_title;
use support_core::{ChatRole, Conversation, FaqArticle, SupportApi, SupportClient};

pub async fn show_faqs(client: &SupportClient, category: Option<&str>) -> Result<()> {
    let catalog = match category {
        Some(category) => match client.faq_category(category).await {
            Ok(articles) => vec![(category.to_string(), articles)],
            Err(e) => {
                println!("{}: {}", "Error fetching FAQ category".red(), e);
                return Ok(());
            }
        },
        None => match client.list_faqs().await {
            Ok(catalog) => catalog.into_iter().collect(),
            Err(e) => {
                println!("{}: {}", "Error fetching FAQs".red(), e);
                println!("Make sure the support backend is running at {}", client.base_url().bold());
                return Ok(());
            }
        },
    };

    println!("\n{}", "📚 We Can Help With".bold().blue());
    println!("{}", "=".repeat(40).dimmed());

    for (category, articles) in catalog {
        println!(
            "\n{} {}",
            category_title(&category).bold().green(),
            format!("({} articles)", articles.len()).dimmed()
        );
        print_articles(&articles);
    }

    Ok(())
}

fn print_articles(articles: &[FaqArticle]) {
    for article in articles {
        println!("  {} {}", "Q:".bold().yellow(), article.question);
        println!("  {} {}", "A:".bold(), article.answer);
    }
}

pub async fn show_health(client: &SupportClient) -> Result<()> {
    match client.health().await {
        Ok(health) => {
            println!(
                "{} {} {}",
                client.base_url().bold(),
                health.status.green(),
                health.timestamp.unwrap_or_default().dimmed()
            );
        }
        Err(e) => {
            println!("{}: {}", "Support backend unreachable".red(), e);
            println!("Expected it at {}", client.base_url().bold());
        }
    }
    Ok(())
}

pub async fn show_transcript(client: &SupportClient, session_id: &str) -> Result<()> {
    let transcript = match client.session_transcript(session_id).await {
        Ok(transcript) => transcript,
        Err(e) => {
            println!("{}: {}", "Error fetching session".red(), e);
            return Ok(());
        }
    };

    let customer = transcript.customer_name.as_deref().unwrap_or("unknown customer");
    println!(
        "\n{} {}",
        format!("💬 Session {}", transcript.session_id).bold().blue(),
        format!("({}, started {})", customer, transcript.created_at).dimmed()
    );
    println!("{}", "=".repeat(50).dimmed());

    for message in &transcript.messages {
        let label = if message.role == ChatRole::User.as_str() {
            "You".bold().cyan()
        } else {
            "Assistant".bold().yellow()
        };
        println!("\n{} {}", label, message.timestamp.dimmed());
        println!("{}", message.content);
    }

    println!("\n{}", "=".repeat(50).dimmed());
    if transcript.escalated {
        let reason = transcript.escalation_reason.unwrap_or_default();
        println!("{} {}", "⚠️  Escalated".bold().red(), reason.dimmed());
    }
    println!("{} messages", transcript.messages.len().to_string().bold());

    Ok(())
}

/// Start a session, send one message and print the reply
pub async fn ask(client: &SupportClient, name: &str, message: &str) -> Result<()> {
    let mut chat = Conversation::new();
    chat.name_input_mut().push_str(name);

    if let Err(e) = chat.start(client).await {
        println!("{}", e.to_string().red());
        return Ok(());
    }
    if let Some(session) = chat.session() {
        println!("{} {}", "Session".dimmed(), session.id.dimmed());
    }

    chat.input_mut().push_str(message);
    chat.send(client).await?;

    if let Some(reply) = chat.messages().last() {
        println!("\n{}", "🤖 Assistant:".bold().yellow());
        println!("{}", reply.content);
    }
    if chat.phase().is_escalated() {
        println!(
            "\n{}",
            "⚠️  This issue has been escalated to our support team. A representative will contact you shortly."
                .bold()
                .red()
        );
    }

    Ok(())
}
