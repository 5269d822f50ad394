//! Неинтерактивное редактирование словаря из командной строки.

use crate::store::{Category, Expansion, Phrase, Store};
use anyhow::{Context, Result};
use std::io::Write;
use tracing::info;

/// Категории, расширения и их фразы
pub fn list(store: &Store, out: &mut impl Write) -> Result<()> {
    let categories = store.read_categories()?;
    if categories.is_empty() {
        writeln!(out, "Словарь пуст")?;
        return Ok(());
    }

    for category in categories {
        writeln!(out, "{}", category.name)?;
        for expansion in store.read_expansions(&category)? {
            let phrases: Vec<String> = store
                .read_phrases(&expansion)?
                .into_iter()
                .map(|phrase| phrase.name)
                .collect();
            writeln!(out, "  {} [{}]", expansion, phrases.join(", "))?;
        }
    }
    Ok(())
}

/// Добавить расширение с фразами, создав категорию при необходимости
pub fn add(store: &Store, category: &str, name: &str, text: &str, phrases: &[String]) -> Result<()> {
    let category = match store.find_category_by_name(category)? {
        Some(existing) => existing,
        None => store.add_category(category)?,
    };

    let expansion = store.add_expansion(&category, name, text)?;
    for phrase in phrases {
        store
            .add_phrase(&expansion, phrase)
            .with_context(|| format!("Фраза '{}' уже занята или некорректна", phrase))?;
    }

    info!("Добавлено расширение {} в категорию {} ({} фраз)", expansion, category, phrases.len());
    Ok(())
}

pub fn rename_category(store: &Store, name: &str, to: &str) -> Result<()> {
    let mut category = category(store, name)?;
    category.name = to.to_string();
    store.update_category(&category)?;
    info!("Категория '{}' переименована в '{}'", name, to);
    Ok(())
}

pub fn rename_expansion(store: &Store, name: &str, to: &str) -> Result<()> {
    let mut expansion = expansion(store, name)?;
    expansion.name = to.to_string();
    store.update_expansion_name(&expansion)?;
    info!("Расширение '{}' переименовано в '{}'", name, to);
    Ok(())
}

pub fn set_text(store: &Store, name: &str, text: &str) -> Result<()> {
    let mut expansion = expansion(store, name)?;
    expansion.text = text.to_string();
    store.update_expansion_text(&expansion)?;
    info!("Текст расширения {} обновлён", expansion);
    Ok(())
}

pub fn rename_phrase(store: &Store, name: &str, to: &str) -> Result<()> {
    let mut phrase = phrase(store, name)?;
    phrase.name = to.to_string();
    store
        .update_phrase(&phrase)
        .with_context(|| format!("Фраза '{}' уже занята", to))?;
    info!("Фраза '{}' переименована в '{}'", name, to);
    Ok(())
}

pub fn remove_category(store: &Store, name: &str) -> Result<()> {
    let category = category(store, name)?;
    store.delete_category(&category)?;
    info!("Категория {} удалена", category);
    Ok(())
}

pub fn remove_expansion(store: &Store, name: &str) -> Result<()> {
    let expansion = expansion(store, name)?;
    store.delete_expansion(&expansion)?;
    info!("Расширение {} удалено вместе с фразами", expansion);
    Ok(())
}

pub fn remove_phrase(store: &Store, name: &str) -> Result<()> {
    let phrase = phrase(store, name)?;
    store.delete_phrase(&phrase)?;
    info!("Фраза {} удалена", phrase);
    Ok(())
}

fn category(store: &Store, name: &str) -> Result<Category> {
    store
        .find_category_by_name(name)?
        .with_context(|| format!("Категория '{}' не найдена", name))
}

fn expansion(store: &Store, name: &str) -> Result<Expansion> {
    store
        .find_expansion_by_name(name)?
        .with_context(|| format!("Расширение '{}' не найдено", name))
}

fn phrase(store: &Store, name: &str) -> Result<Phrase> {
    store
        .find_phrase_by_name(name)?
        .with_context(|| format!("Фраза '{}' не найдена", name))
}
