//! Vacancy intake: a short sequential questionnaire driven by per-chat
//! state, delivered to the employer chat as a text summary.

use teloxide::prelude::*;
use unic_langid::LanguageIdentifier;

use crate::core::config::admin::EMPLOYER_CHAT_ID;
use crate::i18n;
use crate::telegram::menu::main_keyboard;
use crate::telegram::types::{HandlerDeps, HandlerError, UserInfo};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VacancyStep {
    Name,
    Phone,
    Region,
    Skills,
    Interests,
    Position,
    Status,
    Reason,
}

/// Questionnaire progress for one chat.
#[derive(Debug, Clone)]
pub struct VacancyForm {
    pub step: VacancyStep,
    pub name: String,
    pub phone: String,
    pub region: String,
    pub skills: String,
    pub interests: String,
    pub position: String,
    pub status: String,
}

/// A completed application ready to send to the employer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VacancyApplication {
    pub name: String,
    pub phone: String,
    pub region: String,
    pub skills: String,
    pub interests: String,
    pub position: String,
    pub status: String,
    pub reason: String,
}

impl Default for VacancyForm {
    fn default() -> Self {
        Self {
            step: VacancyStep::Name,
            name: String::new(),
            phone: String::new(),
            region: String::new(),
            skills: String::new(),
            interests: String::new(),
            position: String::new(),
            status: String::new(),
        }
    }
}

impl VacancyForm {
    /// Locale key of the prompt to send for the current step.
    pub fn prompt_key(&self) -> &'static str {
        match self.step {
            VacancyStep::Name => "vacancy-start",
            VacancyStep::Phone => "vacancy-phone",
            VacancyStep::Region => "vacancy-region",
            VacancyStep::Skills => "vacancy-skills",
            VacancyStep::Interests => "vacancy-interests",
            VacancyStep::Position => "vacancy-position",
            VacancyStep::Status => "vacancy-status",
            VacancyStep::Reason => "vacancy-reason",
        }
    }

    /// Consume one answer. Returns the finished application after the last
    /// step, otherwise advances to the next one.
    pub fn advance(&mut self, answer: &str) -> Option<VacancyApplication> {
        let answer = answer.trim();
        match self.step {
            VacancyStep::Name => {
                self.name = answer.to_string();
                self.step = VacancyStep::Phone;
                None
            }
            VacancyStep::Phone => {
                self.phone = answer.to_string();
                self.step = VacancyStep::Region;
                None
            }
            VacancyStep::Region => {
                self.region = answer.to_string();
                self.step = VacancyStep::Skills;
                None
            }
            VacancyStep::Skills => {
                self.skills = answer.to_string();
                self.step = VacancyStep::Interests;
                None
            }
            VacancyStep::Interests => {
                self.interests = answer.to_string();
                self.step = VacancyStep::Position;
                None
            }
            VacancyStep::Position => {
                self.position = answer.to_string();
                self.step = VacancyStep::Status;
                None
            }
            VacancyStep::Status => {
                self.status = answer.to_string();
                self.step = VacancyStep::Reason;
                None
            }
            VacancyStep::Reason => Some(VacancyApplication {
                name: std::mem::take(&mut self.name),
                phone: std::mem::take(&mut self.phone),
                region: std::mem::take(&mut self.region),
                skills: std::mem::take(&mut self.skills),
                interests: std::mem::take(&mut self.interests),
                position: std::mem::take(&mut self.position),
                status: std::mem::take(&mut self.status),
                reason: answer.to_string(),
            }),
        }
    }
}

impl VacancyApplication {
    /// Plain-text summary for the employer chat.
    pub fn summary(&self, applicant_id: i64) -> String {
        format!(
            "📄 Yangi ish arizasi\n\n👤 Ism: {}\n📞 Telefon: {}\n📍 Yashash joyi: {}\n💼 Lavozim: {}\n👪 Oilaviy holati: {}\n🛠 Ko'nikmalari: {}\n🎯 Qiziqishlari: {}\n📝 Motivatsiya: {}\n\nTelegram ID: {}",
            self.name,
            self.phone,
            self.region,
            self.position,
            self.status,
            self.skills,
            self.interests,
            self.reason,
            applicant_id
        )
    }
}

/// Start the questionnaire for a chat.
pub async fn start_vacancy(
    bot: &Bot,
    deps: &HandlerDeps,
    chat_id: ChatId,
    lang: &LanguageIdentifier,
) -> Result<(), HandlerError> {
    let form = VacancyForm::default();
    let prompt = form.prompt_key();
    deps.vacancy_forms.insert(chat_id.0, form);
    bot.send_message(chat_id, i18n::t(lang, prompt)).await?;
    Ok(())
}

/// Feed one message into a pending questionnaire.
///
/// Returns false when the chat has no questionnaire in progress, so the
/// caller can fall through to the support relay.
pub async fn handle_vacancy_input(
    bot: &Bot,
    deps: &HandlerDeps,
    user: &UserInfo,
    lang: &LanguageIdentifier,
    text: &str,
) -> Result<bool, HandlerError> {
    let chat_id = ChatId(user.chat_id);
    let Some(mut entry) = deps.vacancy_forms.get_mut(&user.chat_id) else {
        return Ok(false);
    };

    match entry.advance(text) {
        Some(application) => {
            drop(entry);
            deps.vacancy_forms.remove(&user.chat_id);

            if let Some(employer_id) = *EMPLOYER_CHAT_ID {
                if let Err(e) = bot
                    .send_message(ChatId(employer_id), application.summary(user.chat_id))
                    .await
                {
                    log::error!("Failed to deliver vacancy application: {}", e);
                }
            } else {
                log::warn!("No employer chat configured, vacancy application dropped");
            }

            bot.send_message(chat_id, i18n::t(lang, "vacancy-done"))
                .reply_markup(main_keyboard())
                .await?;
        }
        None => {
            let prompt = entry.prompt_key();
            drop(entry);
            bot.send_message(chat_id, i18n::t(lang, prompt)).await?;
        }
    }

    Ok(true)
}
