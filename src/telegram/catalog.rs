//! Catalog browsing inside the bot: categories, product lists, product card.

use fluent_templates::fluent_bundle::FluentArgs;
use teloxide::prelude::*;
use teloxide::types::InlineKeyboardMarkup;
use unic_langid::LanguageIdentifier;

use crate::i18n;
use crate::telegram::cb;
use crate::telegram::types::{HandlerDeps, HandlerError};

/// Show the category keyboard built from the product catalog.
pub async fn show_categories(
    bot: &Bot,
    deps: &HandlerDeps,
    chat_id: ChatId,
    lang: &LanguageIdentifier,
) -> Result<(), HandlerError> {
    let categories = deps.products.categories();
    if categories.is_empty() {
        bot.send_message(chat_id, i18n::t(lang, "catalog-empty")).await?;
        return Ok(());
    }

    let rows: Vec<Vec<_>> = categories
        .iter()
        .map(|category| vec![cb(category.clone(), format!("cat_{category}"))])
        .collect();

    bot.send_message(chat_id, i18n::t(lang, "choose-category"))
        .reply_markup(InlineKeyboardMarkup::new(rows))
        .await?;
    Ok(())
}

/// Show active products of one category as buttons.
pub async fn show_category(
    bot: &Bot,
    deps: &HandlerDeps,
    chat_id: ChatId,
    category: &str,
    lang: &LanguageIdentifier,
) -> Result<(), HandlerError> {
    let products: Vec<_> = deps
        .products
        .by_category(category)
        .into_iter()
        .filter(|p| p.is_active)
        .collect();

    if products.is_empty() {
        bot.send_message(chat_id, i18n::t(lang, "category-empty")).await?;
        return Ok(());
    }

    let mut rows: Vec<Vec<_>> = products
        .iter()
        .map(|p| vec![cb(p.name.clone(), format!("prod_{}", p.id))])
        .collect();
    rows.push(vec![cb(i18n::t(lang, "back-to-menu"), "catalog_menu")]);

    bot.send_message(chat_id, format!("📂 {category}"))
        .reply_markup(InlineKeyboardMarkup::new(rows))
        .await?;
    Ok(())
}

/// Show one product card.
pub async fn show_product(
    bot: &Bot,
    deps: &HandlerDeps,
    chat_id: ChatId,
    product_id: &str,
    lang: &LanguageIdentifier,
) -> Result<(), HandlerError> {
    let Some(product) = deps.products.by_id(product_id) else {
        bot.send_message(chat_id, i18n::t(lang, "category-empty")).await?;
        return Ok(());
    };

    let mut price_args = FluentArgs::new();
    price_args.set("price", product.discounted_price());
    let mut text = format!("🛋️ {}\n\n{}", product.name, product.description);
    if !product.material.is_empty() {
        text.push_str(&format!("\n\nMaterial: {}", product.material));
    }
    if !product.warranty.is_empty() {
        text.push_str(&format!("\nKafolat: {}", product.warranty));
    }
    text.push_str(&format!("\n\n{}", i18n::t_args(lang, "product-price", &price_args)));
    if product.discount > 0 {
        let mut discount_args = FluentArgs::new();
        discount_args.set("discount", product.discount);
        text.push_str(&format!("\n{}", i18n::t_args(lang, "product-discount", &discount_args)));
    }

    let keyboard = InlineKeyboardMarkup::new(vec![vec![cb(
        i18n::t(lang, "back-to-menu"),
        format!("cat_{}", product.category),
    )]]);

    bot.send_message(chat_id, text).reply_markup(keyboard).await?;
    Ok(())
}
