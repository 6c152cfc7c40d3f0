//! Response template pools and the randomness used to pick from them.

use rand::Rng;
use regex::{Captures, Regex};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::LazyLock;

use super::intent::Intent;

/// Chooses an index into a template pool
pub trait PoolPicker: Send + Sync {
    /// Returns an index in `0..len`. `len` is never zero.
    fn pick(&self, len: usize) -> usize;
}

/// Uniform pick backed by the thread-local RNG
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRngPicker;

impl PoolPicker for ThreadRngPicker {
    fn pick(&self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }
}

/// Deterministic picker cycling through a fixed list of indices
#[derive(Debug)]
pub struct SequencePicker {
    indices: Vec<usize>,
    cursor: AtomicUsize,
}

impl SequencePicker {
    pub fn new(indices: Vec<usize>) -> Self {
        Self {
            indices,
            cursor: AtomicUsize::new(0),
        }
    }
}

impl PoolPicker for SequencePicker {
    fn pick(&self, len: usize) -> usize {
        if self.indices.is_empty() {
            return 0;
        }
        let at = self.cursor.fetch_add(1, Ordering::Relaxed) % self.indices.len();
        self.indices[at] % len
    }
}

/// A fixed set of pre-written responses
#[derive(Debug)]
pub struct TemplatePool(&'static [&'static str]);

impl TemplatePool {
    pub fn templates(&self) -> &'static [&'static str] {
        self.0
    }

    pub fn choose(&self, picker: &dyn PoolPicker) -> &'static str {
        match self.0.len() {
            0 => "",
            1 => self.0[0],
            len => self.0[picker.pick(len).min(len - 1)],
        }
    }
}

/// Values interpolated into templates
#[derive(Debug, Clone, Default)]
pub struct TemplateVars {
    pub community: String,
    pub subscribers: String,
    pub response_time: String,
    pub home_city: String,
    pub phone: String,
    pub city: String,
    pub time: String,
    pub question: String,
}

impl TemplateVars {
    fn lookup(&self, key: &str) -> Option<&str> {
        let value = match key {
            "community" => &self.community,
            "subscribers" => &self.subscribers,
            "response_time" => &self.response_time,
            "home_city" => &self.home_city,
            "phone" => &self.phone,
            "city" => &self.city,
            "time" => &self.time,
            "question" => &self.question,
            _ => return None,
        };
        Some(value.as_str())
    }
}

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([a-z_]+)\}").expect("Invalid regex: template placeholder"));

/// Single-pass placeholder substitution. Unknown placeholders are left untouched,
/// and substituted values are never re-expanded.
pub fn render(template: &str, vars: &TemplateVars) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| match vars.lookup(&caps[1]) {
            Some(value) => value.to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

pub static APPLICATION_STEPS: TemplatePool = TemplatePool(&[
    "📝 Начнем оформление заявки! Укажите:\n1. ФИО полностью\n2. Желаемую вакансию\n3. Опыт работы\n4. Контактный телефон\n\n📞 Вопросы: {phone}",
    "📞 Отлично! Теперь укажите:\n5. Возраст\n6. Образование\n7. Гражданство\n8. Регион проживания",
    "✅ Почти готово! Последние данные:\n9. Наличие медкнижки\n10. Водительские права (категории)\n11. Готовность к вахте",
]);

pub static COMMUNITY_INFO: TemplatePool = TemplatePool(&[
    "ℹ️ Информация о сообществе \"{community}\":\n\n👥 Подписчиков: {subscribers}\n⏱ Ответ за: {response_time}\n📍 {home_city}\n\n💼 Основные направления:\n• Вахтовая работа в Уфе и Башкирии\n• Трудоустройство по всей России\n• Консультации по вакансиям\n• Поддержка соискателей",
]);

pub static GREETING: TemplatePool = TemplatePool(&[
    "👋 Приветствую в сообществе \"{community}\"! 💼\n\nЯ помогу с поиском работы, оформлением заявок и отвечу на вопросы о вахтовой работе. Что вас интересует?",
    "Здравствуйте! 😊 Это бот сообщества \"{community}\". Спросите про вакансии, зарплаты или график вахты.",
]);

pub static SALARY: TemplatePool = TemplatePool(&[
    "💰 Уровень зарплат на вахте:\n\n• Рабочие специальности: 75 000 - 100 000 ₽\n• Водители: 80 000 - 110 000 ₽\n• Операторы, электромонтеры: 85 000 - 120 000 ₽\n• Инженеры, мастера: от 100 000 ₽\n\n💡 Конкретная зарплата зависит от опыта и графика работы!",
]);

pub static SCHEDULE: TemplatePool = TemplatePool(&[
    "📅 Стандартные графики вахты:\n\n• 15/15 - 15 дней работы, 15 дней отдыха\n• 30/30 - 30 дней работы, 30 дней отдыха\n• 60/30 - 60 дней работы, 30 дней отдыха\n\n🕐 Рабочий день обычно 10-12 часов с перерывами",
]);

pub static REQUIREMENTS: TemplatePool = TemplatePool(&[
    "📋 Основные требования:\n\n• Возраст от 18 лет\n• Медкнижка (для некоторых вакансий)\n• Отсутствие судимости\n• Готовность к физическому труду\n• Для водителей - соответствующие категории\n\n✅ Большинство вакансий не требуют высшего образования!",
]);

pub static HUMOR: TemplatePool = TemplatePool(&[
    "Знаете, почему вахтовики такие сильные? Потому что они поднимают не только тяжести, но и настроение! 😄",
    "Вахтовик - это человек, который полмесяца зарабатывает деньги, а полмесяца вспоминает, куда их потратил! 💰",
    "Самое сложное в вахте - объяснить жене, почему в выходные нужно отдыхать, а не делать ремонт! 🛠️",
]);

pub static MONETIZATION: TemplatePool = TemplatePool(&[
    "🌟 Поддержка сообщества через VK Donut:\n\n💖 Регулярная поддержка от 50 ₽/мес\n🎁 Эксклюзивный контент для подписчиков\n⚡ Приоритетный доступ к вакансиям\n📞 Персональные консультации\n\nПоддержите развитие сообщества! ❤️",
]);

pub static WEATHER: TemplatePool = TemplatePool(&[
    "🌤 Точный прогноз для города {city} лучше смотреть в приложении погоды. На вахту в любой сезон берите тёплую одежду и запасную обувь!",
    "☔ Погоду ({city}) я не отслеживаю, но знаю главное: на объектах выдают спецодежду по сезону.",
]);

pub static TIME: TemplatePool = TemplatePool(&[
    "🕐 Сейчас {time}. Администраторы отвечают в течение {response_time}.",
    "⏰ На часах {time}, самое время посмотреть свежие вакансии!",
]);

pub static GENERIC: TemplatePool = TemplatePool(&[
    "💼 Чем могу помочь? Сообщество \"{community}\" специализируется на:\n\n🔍 Поиске вакансий вахтовым методом\n📝 Оформлении заявок и консультациях\n🤝 Поддержке соискателей\n😄 Создании дружеской атмосферы\n\nЗадайте вопрос о вакансиях, условиях работы или воспользуйтесь быстрыми кнопками!",
    "🤔 По вопросу «{question}» лучше уточнить у администраторов сообщества \"{community}\". А пока могу рассказать о вакансиях, зарплатах и графиках вахты.",
]);

/// Pool for a text intent. Job search is structured and has no pool.
pub fn pool_for(intent: Intent) -> Option<&'static TemplatePool> {
    match intent {
        Intent::JobSearch => None,
        Intent::Application => Some(&APPLICATION_STEPS),
        Intent::CommunityInfo => Some(&COMMUNITY_INFO),
        Intent::Greeting => Some(&GREETING),
        Intent::Salary => Some(&SALARY),
        Intent::Schedule => Some(&SCHEDULE),
        Intent::Requirements => Some(&REQUIREMENTS),
        Intent::Humor => Some(&HUMOR),
        Intent::Monetization => Some(&MONETIZATION),
        Intent::Weather => Some(&WEATHER),
        Intent::Time => Some(&TIME),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_substitutes_known_placeholders() {
        let vars = TemplateVars {
            community: "Вахта Уфа".to_string(),
            city: "Казань".to_string(),
            ..Default::default()
        };
        assert_eq!(render("{community} / {city}", &vars), "Вахта Уфа / Казань");
    }

    #[test]
    fn test_render_keeps_unknown_placeholders() {
        let vars = TemplateVars::default();
        assert_eq!(render("{unknown} ok", &vars), "{unknown} ok");
    }

    #[test]
    fn test_render_does_not_reexpand_values() {
        let vars = TemplateVars {
            question: "а где {community}?".to_string(),
            community: "X".to_string(),
            ..Default::default()
        };
        assert_eq!(render("{question}", &vars), "а где {community}?");
    }

    #[test]
    fn test_sequence_picker_cycles() {
        let picker = SequencePicker::new(vec![2, 0]);
        assert_eq!(HUMOR.choose(&picker), HUMOR.templates()[2]);
        assert_eq!(HUMOR.choose(&picker), HUMOR.templates()[0]);
        assert_eq!(HUMOR.choose(&picker), HUMOR.templates()[2]);
    }

    #[test]
    fn test_sequence_picker_wraps_out_of_range_index() {
        let picker = SequencePicker::new(vec![7]);
        assert_eq!(picker.pick(3), 1);
    }

    #[test]
    fn test_thread_rng_picker_stays_in_range() {
        let picker = ThreadRngPicker;
        for _ in 0..200 {
            assert!(picker.pick(3) < 3);
        }
    }

    #[test]
    fn test_every_text_intent_has_non_empty_pool() {
        for intent in [
            Intent::Application,
            Intent::CommunityInfo,
            Intent::Greeting,
            Intent::Salary,
            Intent::Schedule,
            Intent::Requirements,
            Intent::Humor,
            Intent::Monetization,
            Intent::Weather,
            Intent::Time,
        ] {
            let pool = pool_for(intent).unwrap();
            assert!(!pool.templates().is_empty(), "empty pool for {}", intent);
        }
        assert!(pool_for(Intent::JobSearch).is_none());
    }
}
