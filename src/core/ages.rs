use chrono::{Datelike, Days, Months, NaiveDate};

/// Age in whole years on `today` for someone born on `date_of_birth`
///
/// Derived at evaluation time, never stored.
#[inline]
pub fn age_on(date_of_birth: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - date_of_birth.year();
    if (today.month(), today.day()) < (date_of_birth.month(), date_of_birth.day()) {
        age -= 1;
    }
    age
}

/// Inclusive birth-date window matching the age window `[min_age, max_age]` on `today`
///
/// Returns `(oldest, youngest)`: the earliest and latest dates of birth whose
/// age on `today` lies inside the window. Lets the attribute store filter on
/// a stored date instead of a derived age.
pub fn birth_date_range(min_age: i32, max_age: i32, today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let youngest = years_before(today, min_age.max(0));
    let oldest = years_before(today, max_age.max(0).saturating_add(1))
        .checked_add_days(Days::new(1))
        .unwrap_or(NaiveDate::MIN);
    (oldest, youngest)
}

fn years_before(date: NaiveDate, years: i32) -> NaiveDate {
    date.checked_sub_months(Months::new((years as u32).saturating_mul(12)))
        .unwrap_or(NaiveDate::MIN)
}
