mod test_compressed;
mod test_record;
