use crate::controller::Intake;
use application::transfer::GetTopDto;
use kernel::prelude::entity::SelectLimit;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct TopRequest {
    #[serde(default)]
    limit: SelectLimit,
}

pub struct Transformer;

impl Intake<TopRequest> for Transformer {
    type To = GetTopDto;
    fn emit(&self, input: TopRequest) -> Self::To {
        GetTopDto {
            limit: *input.limit.as_ref(),
        }
    }
}
